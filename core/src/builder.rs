//! Turn a [`RequestParameters`] into an [`HttpRequest`].
//!
//! # Design
//! Every builder is a pure function: it parses the URL, encodes the body
//! (if any) and attaches headers, cookies and credentials, but never does
//! network I/O. The only I/O is reading file attachments from disk.
//!
//! Headers produced by the body encoding (`Content-Type`) win over
//! explicit headers of the same name. Everything else is applied the same
//! way on every path.

use std::io::{self, Read};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use url::Url;

use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest};
use crate::form_data::FormData;
use crate::params::{Credentials, FileAttachment, RequestParameters};

/// Multipart field name every file attachment is sent under.
pub const FILE_FIELD_NAME: &str = "avatar";

/// Content type of a file part when the attachment does not name one.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Stands in for a file name when encoding the assembled body fails.
const MULTIPART_BODY: &str = "<multipart body>";

/// Build a request without a body.
///
/// Form values are attached as request-local state and are not added to the
/// query string; use `query_params` for that.
pub fn build_get_request(params: &RequestParameters) -> Result<HttpRequest, RequestError> {
    let mut request = HttpRequest::new(params.method, parse_url(params)?);
    request.form = params.values.clone();
    apply_common(&mut request, params, &[]);
    describe_request(&request, params);
    Ok(request)
}

/// Build a multipart/form-data request carrying every file in `files`
/// followed by the scalar form values.
///
/// Fails with [`RequestError::NoFilesProvided`] when `files` is empty.
pub fn build_multipart_request(params: &RequestParameters) -> Result<HttpRequest, RequestError> {
    if params.files.is_empty() {
        return Err(RequestError::NoFilesProvided);
    }
    let url = parse_url(params)?;

    let mut form = FormData::new();
    for file in &params.files {
        let content_type = file.content_type.as_deref().unwrap_or(DEFAULT_FILE_CONTENT_TYPE);
        form.file(FILE_FIELD_NAME, file.base_name(), content_type, read_file(file)?);
    }
    for (name, value) in params.values.pairs() {
        form.text(name, value);
    }
    multipart_request(params, url, form)
}

/// Build a multipart/form-data request from the form values alone.
/// Attachments, if any, are ignored.
pub fn build_form_multipart_request(params: &RequestParameters) -> Result<HttpRequest, RequestError> {
    let url = parse_url(params)?;

    let mut form = FormData::new();
    for (name, value) in params.values.pairs() {
        form.text(name, value);
    }
    multipart_request(params, url, form)
}

/// Build an `application/x-www-form-urlencoded` request from the form values.
pub fn build_urlencoded_request(params: &RequestParameters) -> Result<HttpRequest, RequestError> {
    let url = parse_url(params)?;
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.values.pairs())
        .finish();
    Ok(encoded_request(params, url, FORM_URLENCODED.to_string(), body.into_bytes()))
}

/// Build a request whose body is `params.body` verbatim.
pub fn build_raw_request(params: &RequestParameters) -> Result<HttpRequest, RequestError> {
    let mut request = HttpRequest::new(params.method, parse_url(params)?);
    request.form = params.values.clone();
    request.body = params.body.as_ref().map(|b| b.clone().into_bytes());
    apply_common(&mut request, params, &[]);
    describe_request(&request, params);
    Ok(request)
}

/// Pick a builder from the shape of the parameters: attachments mean
/// multipart, a raw body is sent as-is, form values on a non-GET method are
/// URL-encoded, and anything else goes out without a body.
pub fn build_request(params: &RequestParameters) -> Result<HttpRequest, RequestError> {
    if !params.files.is_empty() {
        build_multipart_request(params)
    } else if params.body.is_some() {
        build_raw_request(params)
    } else if params.method != HttpMethod::Get && !params.values.is_empty() {
        build_urlencoded_request(params)
    } else {
        build_get_request(params)
    }
}

/// Log the shape of a built request at debug level. Credentials are
/// reduced to the username.
pub fn describe_request(request: &HttpRequest, params: &RequestParameters) {
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        headers = ?request.headers.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
        cookies = ?request.cookies().into_iter().map(|c| c.name).collect::<Vec<_>>(),
        form_fields = ?params.values.names().collect::<Vec<_>>(),
        timeout_sec = params.timeout_sec,
        user_agent = ?params.user_agent,
        username = ?params.credentials.as_ref().map(|c| c.username.as_str()),
        files = ?params.files.iter().map(FileAttachment::base_name).collect::<Vec<_>>(),
        body_bytes = request.body.as_ref().map_or(0, Vec::len),
        "built request"
    );
}

fn parse_url(params: &RequestParameters) -> Result<Url, RequestError> {
    let mut url = Url::parse(&params.url).map_err(|source| RequestError::InvalidUrl {
        url: params.url.clone(),
        source,
    })?;
    if !params.query_params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.query_params.pairs());
    }
    Ok(url)
}

fn multipart_request(params: &RequestParameters, url: Url, form: FormData) -> Result<HttpRequest, RequestError> {
    let encoded = form.encode().map_err(|source| RequestError::IoCopyFailed {
        file: MULTIPART_BODY.to_string(),
        source,
    })?;
    Ok(encoded_request(params, url, encoded.content_type(), encoded.body))
}

fn encoded_request(
    params: &RequestParameters,
    url: Url,
    content_type: String,
    body: Vec<u8>,
) -> HttpRequest {
    let mut request = HttpRequest::new(params.method, url);
    request.set_header("Content-Type", content_type);
    request.form = params.values.clone();
    request.body = Some(body);
    apply_common(&mut request, params, &["Content-Type"]);
    describe_request(&request, params);
    request
}

/// Apply explicit headers, user agent, credentials, cookies and the caller
/// deadline. Explicit headers named in `reserved` are dropped.
fn apply_common(request: &mut HttpRequest, params: &RequestParameters, reserved: &[&str]) {
    for (name, value) in &params.headers {
        if reserved.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            tracing::warn!(header = %name, "explicit header conflicts with body encoding, ignoring");
            continue;
        }
        request.set_header(name, value.clone());
    }
    if let Some(user_agent) = &params.user_agent {
        request.set_header("User-Agent", user_agent.clone());
    }
    if let Some(credentials) = &params.credentials {
        request.set_header("Authorization", basic_auth(credentials));
    }
    for cookie in &params.cookies {
        request.add_cookie(cookie);
    }
    request.deadline = params.deadline;
}

fn basic_auth(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.username, credentials.password);
    format!("Basic {}", STANDARD.encode(raw))
}

fn read_file(file: &FileAttachment) -> Result<Vec<u8>, RequestError> {
    let reader = file.source.open().map_err(|source| RequestError::IoCopyFailed {
        file: file.name.clone(),
        source,
    })?;
    copy_file(&file.name, reader)
}

fn copy_file(name: &str, mut reader: impl Read) -> Result<Vec<u8>, RequestError> {
    let mut data = Vec::new();
    io::copy(&mut reader, &mut data).map_err(|source| RequestError::IoCopyFailed {
        file: name.to_string(),
        source,
    })?;
    Ok(data)
}

//! The request parameter set and its building blocks.
//!
//! # Design
//! `RequestParameters` is one configuration structure for every kind of
//! call this crate makes. Only `url` and `method` are required; everything
//! else defaults, so callers fill in what they need with struct-update
//! syntax. The type deserializes from JSON, which is how the `reqkit`
//! binary loads it.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::http::HttpMethod;

/// Everything that can vary about an outgoing request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestParameters {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    /// Form fields. Sent as multipart fields or URL-encoded pairs depending
    /// on the builder; the GET builder keeps them request-local.
    #[serde(default)]
    pub values: FormValues,
    /// Raw body for non-form data.
    #[serde(default)]
    pub body: Option<String>,
    /// Wall-clock timeout in seconds. Zero or negative means no deadline.
    #[serde(default)]
    pub timeout_sec: i64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub query_params: FormValues,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Cancellation deadline supplied by the caller. Not part of the
    /// serialized form.
    #[serde(skip)]
    pub deadline: Option<Instant>,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub tls: TlsSettings,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    /// Upper bound on the response body the transport will buffer.
    /// `None` uses the transport's default.
    #[serde(default)]
    pub max_response_bytes: Option<u64>,
}

impl RequestParameters {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Default::default()
        }
    }
}

/// A name/value cookie pair as sent in a `Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a single `name=value` pair. Returns `None` for empty names.
    pub(crate) fn parse_pair(pair: &str) -> Option<Self> {
        let (name, value) = pair.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value.trim().trim_matches('"')))
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Multi-valued form fields, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the values of `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Replace the values of `name` with the single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), vec![value.into()]);
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every `(name, value)` pair, names in order, values in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Accept any server certificate. Only meant for local test servers.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

/// Where a file attachment's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSource {
    /// Read from disk when the request is built.
    Path(PathBuf),
    Inline(Vec<u8>),
}

impl FileSource {
    pub(crate) fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            FileSource::Path(path) => Ok(Box::new(File::open(path)?)),
            FileSource::Inline(bytes) => Ok(Box::new(bytes.as_slice())),
        }
    }
}

/// A file to upload as one multipart section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// File name as supplied; only its base name goes on the wire.
    pub name: String,
    pub source: FileSource,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl FileAttachment {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.to_string_lossy().into_owned(),
            source: FileSource::Path(path),
            content_type: None,
        }
    }

    pub fn inline(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Inline(bytes.into()),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The last path component of `name`, or `name` itself when it has none.
    pub fn base_name(&self) -> &str {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.name)
    }
}

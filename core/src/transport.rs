//! Executing built requests against the network.
//!
//! # Design
//! `Transport` is the seam between the deterministic builders and real I/O.
//! The dispatcher hands a transport one `HttpRequest` plus the options that
//! only matter at execution time (timeout, proxy, TLS). `UreqTransport` is
//! the production implementation; tests substitute their own.

use std::io;
use std::time::Duration;

use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpRequest, HttpResponse};
use crate::params::{RequestParameters, TlsSettings};

/// Response bodies larger than this fail unless the parameters raise it.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

/// Execution-time settings derived from the parameters by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Wall-clock budget for the whole call. `None` means unbounded.
    pub timeout: Option<Duration>,
    pub proxy_url: Option<String>,
    pub tls: TlsSettings,
    pub max_response_bytes: u64,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            proxy_url: None,
            tls: TlsSettings::default(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl TransportOptions {
    pub fn from_params(params: &RequestParameters, timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            proxy_url: params.proxy_url.clone(),
            tls: params.tls.clone(),
            max_response_bytes: params.max_response_bytes.unwrap_or(DEFAULT_MAX_RESPONSE_BYTES),
        }
    }
}

/// Executes one request synchronously.
///
/// Implementations return non-2xx statuses as data; only failures to
/// obtain a response are errors.
pub trait Transport {
    fn execute(
        &self,
        request: HttpRequest,
        options: &TransportOptions,
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(
        &self,
        request: HttpRequest,
        options: &TransportOptions,
    ) -> Result<HttpResponse, TransportError> {
        (**self).execute(request, options)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Builds an agent per call from the options; nothing is pooled across
/// calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    fn agent(options: &TransportOptions) -> Result<Agent, TransportError> {
        let proxy = options
            .proxy_url
            .as_deref()
            .map(ureq::Proxy::new)
            .transpose()?;
        let tls = TlsConfig::builder()
            .disable_verification(options.tls.insecure_skip_verify)
            .build();

        Ok(Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(options.timeout)
            .proxy(proxy)
            .tls_config(tls)
            .build()
            .new_agent())
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: HttpRequest,
        options: &TransportOptions,
    ) -> Result<HttpResponse, TransportError> {
        let agent = Self::agent(options)?;

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = match &request.body {
            Some(body) => agent.run(builder.body(body.as_slice())?)?,
            None => agent.run(builder.body(())?)?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(options.max_response_bytes)
            .read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        let kind = match &err {
            ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
            ureq::Error::Io(e) => io_kind(e),
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => TransportErrorKind::Connect,
            _ => TransportErrorKind::Other,
        };
        TransportError::new(kind, err.to_string())
    }
}

impl From<ureq::http::Error> for TransportError {
    fn from(err: ureq::http::Error) -> Self {
        TransportError::new(TransportErrorKind::Other, err.to_string())
    }
}

fn io_kind(err: &io::Error) -> TransportErrorKind {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportErrorKind::Timeout,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => TransportErrorKind::Connect,
        _ => TransportErrorKind::Other,
    }
}

//! Error types for building and dispatching requests.
//!
//! # Design
//! Four failure classes: the target URL does not parse, the multipart
//! builder was called without attachments, an attachment could not be
//! read, or the transport failed. Transport failures keep a coarse kind so
//! callers can tell a timeout from a refused connection without matching on
//! client-specific error types.

use std::fmt;
use std::io;

/// Errors returned by the builders and the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The target URL could not be parsed.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The multipart-with-files builder was called with no files.
    #[error("no files provided")]
    NoFilesProvided,

    /// An attachment's bytes could not be copied into the request body.
    #[error("failed to copy file {file:?} into request body: {source}")]
    IoCopyFailed {
        file: String,
        #[source]
        source: io::Error,
    },

    /// The HTTP client failed, including deadline expiry.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Transport(e) if e.is_timeout())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The deadline expired before a response was read.
    Timeout,
    /// The connection could not be established.
    Connect,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => f.write_str("timeout"),
            TransportErrorKind::Connect => f.write_str("connect"),
            TransportErrorKind::Other => f.write_str("transport"),
        }
    }
}

/// Failure reported by a [`crate::transport::Transport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn deadline_exceeded() -> Self {
        Self::new(TransportErrorKind::Timeout, "deadline exceeded")
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

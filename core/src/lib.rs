//! Build and send HTTP requests described by a single parameter set.
//!
//! # Overview
//! A caller fills in a [`RequestParameters`], a builder turns it into an
//! [`HttpRequest`] value (URL, headers, cookies, optional multipart or
//! URL-encoded body), and the dispatcher runs that value through a
//! [`Transport`] with the requested timeout.
//!
//! # Design
//! - Builders are pure: they produce plain data and never touch the
//!   network, so every encoding decision is testable without a server.
//! - The dispatcher is synchronous and blocking, one call per invocation.
//!   The only cancellation mechanism is the timeout.
//! - [`UreqTransport`] is the production transport; anything implementing
//!   [`Transport`] can stand in for it.

pub mod builder;
pub mod dispatch;
pub mod error;
pub mod form_data;
pub mod http;
pub mod params;
pub mod transport;

pub use builder::{
    build_form_multipart_request, build_get_request, build_multipart_request, build_raw_request,
    build_request, build_urlencoded_request, describe_request,
};
pub use dispatch::{
    dispatch, effective_timeout, make_form_post_request, make_get_request, make_post_request, send,
    MAX_TIMEOUT,
};
pub use error::{RequestError, TransportError, TransportErrorKind};
pub use form_data::{EncodedForm, FormData};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{Cookie, Credentials, FileAttachment, FileSource, FormValues, RequestParameters, TlsSettings};
pub use transport::{Transport, TransportOptions, UreqTransport, DEFAULT_MAX_RESPONSE_BYTES};

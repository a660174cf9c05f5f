//! Build a request from parameters and run it through a [`Transport`].
//!
//! # Design
//! The effective timeout is the tighter of the caller's deadline (carried
//! on the request) and `timeout_sec` counted from dispatch. A deadline that
//! has already passed fails immediately without calling the transport.
//! A `timeout_sec` too large for the clock to represent, or above
//! [`MAX_TIMEOUT`], does not bound the call.
//! Errors are returned unchanged; there is no retry.

use std::time::{Duration, Instant};

use crate::builder::{build_form_multipart_request, build_get_request, build_multipart_request, build_request};
use crate::error::{RequestError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::params::RequestParameters;
use crate::transport::{Transport, TransportOptions};

/// Longest explicit timeout honoured. The transport adds the timeout to the
/// current instant, so it has to stay well inside the clock's range.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Build with [`build_get_request`] and execute.
pub fn make_get_request<T: Transport + ?Sized>(
    params: &RequestParameters,
    transport: &T,
) -> Result<HttpResponse, RequestError> {
    let request = build_get_request(params)?;
    dispatch(request, params, transport)
}

/// Build with [`build_multipart_request`] and execute.
pub fn make_post_request<T: Transport + ?Sized>(
    params: &RequestParameters,
    transport: &T,
) -> Result<HttpResponse, RequestError> {
    let request = build_multipart_request(params)?;
    dispatch(request, params, transport)
}

/// Build with [`build_form_multipart_request`] and execute.
pub fn make_form_post_request<T: Transport + ?Sized>(
    params: &RequestParameters,
    transport: &T,
) -> Result<HttpResponse, RequestError> {
    let request = build_form_multipart_request(params)?;
    dispatch(request, params, transport)
}

/// Build with [`build_request`] and execute.
pub fn send<T: Transport + ?Sized>(
    params: &RequestParameters,
    transport: &T,
) -> Result<HttpResponse, RequestError> {
    let request = build_request(params)?;
    dispatch(request, params, transport)
}

/// Execute an already built request, applying `params.timeout_sec`.
pub fn dispatch<T: Transport + ?Sized>(
    request: HttpRequest,
    params: &RequestParameters,
    transport: &T,
) -> Result<HttpResponse, RequestError> {
    let started = Instant::now();
    let timeout = effective_timeout(request.deadline, params.timeout_sec, started)?;
    let options = TransportOptions::from_params(params, timeout);

    let method = request.method;
    let url = request.url.to_string();
    let result = transport.execute(request, &options);
    let elapsed = started.elapsed();

    match &result {
        Ok(response) => {
            tracing::debug!(%method, %url, status = response.status, ?elapsed, "request completed")
        }
        Err(err) => tracing::debug!(%method, %url, error = %err, ?elapsed, "request failed"),
    }
    Ok(result?)
}

/// Remaining time budget at `now`, or `None` when neither a deadline nor a
/// positive `timeout_sec` bounds the call.
pub fn effective_timeout(
    deadline: Option<Instant>,
    timeout_sec: i64,
    now: Instant,
) -> Result<Option<Duration>, TransportError> {
    let explicit = u64::try_from(timeout_sec)
        .ok()
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .filter(|&timeout| timeout <= MAX_TIMEOUT && now.checked_add(timeout).is_some());

    let inherited = match deadline {
        Some(deadline) => match deadline.checked_duration_since(now) {
            Some(remaining) if !remaining.is_zero() => Some(remaining),
            _ => return Err(TransportError::deadline_exceeded()),
        },
        None => None,
    };

    Ok(match (explicit, inherited) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    })
}

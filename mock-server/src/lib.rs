//! Local HTTP server used as a target by the request tests.
//!
//! Any path answers `GET` with 202, a `TestCookie` cookie and a text line,
//! and `POST` with a text line; other methods get 405. The routes below
//! only take over one method and fall back to that behaviour for the rest:
//! `GET /delay/{secs}` answers like `GET` after sleeping, `GET /bytes`
//! serves a body that is not valid UTF-8, and `POST /inspect` reports what
//! it received as JSON.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Notify},
};

pub const GET_BODY: &str = "Test Handler - GET\n";
pub const POST_BODY: &str = "Test Handler - POST\n";
/// PNG signature bytes followed by a UTF-16 byte order mark.
pub const BINARY_BODY: &[u8] = &[0x89, b'P', b'N', b'G', 0xFF, 0xFE];

/// What `/inspect` saw in a request.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub method: String,
    pub content_type: Option<String>,
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub authorization: Option<String>,
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
    pub body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub size: usize,
}

/// Woken on shutdown so delayed handlers stop sleeping.
type Wake = Arc<Notify>;

pub fn app() -> Router {
    router(Arc::new(Notify::new()))
}

fn router(wake: Wake) -> Router {
    Router::new()
        .route("/delay/{secs}", get(delayed).fallback(echo))
        .route("/bytes", get(binary).fallback(echo))
        .route("/inspect", post(inspect).fallback(echo))
        .fallback(echo)
        .with_state(wake)
}

pub async fn run(listener: TcpListener) -> Result<(), io::Error> {
    axum::serve(listener, app()).await
}

/// A running server on its own thread and runtime.
///
/// Binds `127.0.0.1` on a random port. Dropping the handle shuts the
/// server down gracefully and joins its thread.
pub struct MockServer {
    addr: SocketAddr,
    wake: Wake,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<io::Result<()>>>,
}

impl MockServer {
    pub fn start() -> io::Result<Self> {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = std_listener.local_addr()?;
        std_listener.set_nonblocking(true)?;

        let wake: Wake = Arc::new(Notify::new());
        let app = router(wake.clone());
        let (tx, rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(async move {
                let listener = TcpListener::from_std(std_listener)?;
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = rx.await;
                    })
                    .await
            })
        });
        tracing::debug!(%addr, "mock server started");

        Ok(Self {
            addr,
            wake,
            shutdown: Some(tx),
            thread: Some(thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop accepting connections, let in-flight requests finish and join
    /// the server thread.
    pub fn shutdown(mut self) -> io::Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> io::Result<()> {
        self.wake.notify_waiters();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.thread.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(io::Error::other("mock server thread panicked")),
            },
            None => Ok(()),
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(%err, "mock server did not shut down cleanly");
        }
    }
}

async fn echo(method: Method) -> Response {
    match method {
        Method::GET => get_response(),
        Method::POST => POST_BODY.into_response(),
        _ => (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n").into_response(),
    }
}

fn get_response() -> Response {
    (
        StatusCode::ACCEPTED,
        [(header::SET_COOKIE, "TestCookie=Result")],
        GET_BODY,
    )
        .into_response()
}

async fn binary() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], BINARY_BODY).into_response()
}

async fn delayed(State(wake): State<Wake>, Path(secs): Path<u64>) -> Response {
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
        _ = wake.notified() => {}
    }
    get_response()
}

async fn inspect(request: Request) -> Result<Json<Inspection>, (StatusCode, String)> {
    let headers = request.headers();
    let mut inspection = Inspection {
        method: request.method().to_string(),
        content_type: header_value(headers, header::CONTENT_TYPE),
        cookie: header_value(headers, header::COOKIE),
        user_agent: header_value(headers, header::USER_AGENT),
        authorization: header_value(headers, header::AUTHORIZATION),
        ..Default::default()
    };
    let content_type = inspection.content_type.clone().unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(bad_request)?;
        while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(bad_request)?;
                    inspection.body_bytes += data.len();
                    inspection.files.push(UploadedFile {
                        field: name,
                        filename,
                        content_type,
                        size: data.len(),
                    });
                }
                None => {
                    let value = field.text().await.map_err(bad_request)?;
                    inspection.body_bytes += value.len();
                    inspection.fields.push((name, value));
                }
            }
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(bad_request)?;
        inspection.body_bytes = pairs.iter().map(|(k, v)| k.len() + v.len()).sum();
        inspection.fields = pairs;
    } else {
        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(bad_request)?;
        inspection.body_bytes = body.len();
    }

    Ok(Json(inspection))
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn bad_request(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspection_serializes_fields_as_pairs() {
        let inspection = Inspection {
            method: "POST".to_string(),
            fields: vec![("firstName".to_string(), "John".to_string())],
            ..Default::default()
        };
        let json = serde_json::to_value(&inspection).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["fields"][0][0], "firstName");
        assert_eq!(json["fields"][0][1], "John");
        assert!(json["content_type"].is_null());
    }

    #[test]
    fn inspection_roundtrips_through_json() {
        let inspection = Inspection {
            method: "POST".to_string(),
            files: vec![UploadedFile {
                field: "avatar".to_string(),
                filename: "johvi.png".to_string(),
                content_type: Some("image/png".to_string()),
                size: 3,
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&inspection).unwrap();
        let back: Inspection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.files, inspection.files);
    }

    #[test]
    fn server_starts_and_shuts_down() {
        let server = MockServer::start().unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert!(server.url("/x").starts_with("http://127.0.0.1:"));
        server.shutdown().unwrap();
    }
}

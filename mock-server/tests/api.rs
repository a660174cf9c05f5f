use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Inspection, BINARY_BODY, GET_BODY, POST_BODY};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn empty(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn get_returns_202_with_cookie() {
    let resp = app().oneshot(empty("GET", "/registration")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(
        resp.headers().get(http::header::SET_COOKIE).unwrap(),
        "TestCookie=Result"
    );
    assert_eq!(body_bytes(resp).await, GET_BODY.as_bytes());
}

#[tokio::test]
async fn post_returns_text_line() {
    let resp = app().oneshot(empty("POST", "/registration")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(http::header::SET_COOKIE).is_none());
    assert_eq!(body_bytes(resp).await, POST_BODY.as_bytes());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    for method in ["PUT", "DELETE", "PATCH"] {
        let resp = app().oneshot(empty(method, "/anything")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}

// --- delay ---

#[tokio::test]
async fn delay_zero_answers_like_get() {
    let resp = app().oneshot(empty("GET", "/delay/0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(body_bytes(resp).await, GET_BODY.as_bytes());
}

#[tokio::test]
async fn delay_rejects_non_numeric_seconds() {
    let resp = app().oneshot(empty("GET", "/delay/soon")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_to_delay_answers_like_post() {
    let resp = app().oneshot(empty("POST", "/delay/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, POST_BODY.as_bytes());
}

// --- bytes ---

#[tokio::test]
async fn bytes_serves_non_utf8_body() {
    let resp = app().oneshot(empty("GET", "/bytes")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(http::header::CONTENT_TYPE).unwrap(), "image/png");
    let body = body_bytes(resp).await;
    assert_eq!(body, BINARY_BODY);
    assert!(std::str::from_utf8(&body).is_err());
}

// --- inspect ---

#[tokio::test]
async fn get_to_inspect_answers_like_get() {
    let resp = app().oneshot(empty("GET", "/inspect")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(body_bytes(resp).await, GET_BODY.as_bytes());
}

#[tokio::test]
async fn put_to_routed_paths_is_rejected() {
    for uri in ["/inspect", "/delay/0", "/bytes"] {
        let resp = app().oneshot(empty("PUT", uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }
}

#[tokio::test]
async fn inspect_reads_multipart_fields_and_files() {
    let body = "--B\r\n\
        Content-Disposition: form-data; name=\"avatar\"; filename=\"johvi.png\"\r\n\
        Content-Type: image/png\r\n\
        \r\n\
        PNG\r\n\
        --B\r\n\
        Content-Disposition: form-data; name=\"firstName\"\r\n\
        \r\n\
        John\r\n\
        --B--\r\n";
    let req = Request::builder()
        .method("POST")
        .uri("/inspect")
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B")
        .header(http::header::COOKIE, "session=abc")
        .body(body.to_string())
        .unwrap();

    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let seen: Inspection = body_json(resp).await;

    assert_eq!(seen.method, "POST");
    assert_eq!(seen.cookie.as_deref(), Some("session=abc"));
    assert_eq!(seen.fields, vec![("firstName".to_string(), "John".to_string())]);
    assert_eq!(seen.files.len(), 1);
    assert_eq!(seen.files[0].field, "avatar");
    assert_eq!(seen.files[0].filename, "johvi.png");
    assert_eq!(seen.files[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(seen.files[0].size, 3);
}

#[tokio::test]
async fn inspect_reads_urlencoded_pairs() {
    let req = Request::builder()
        .method("POST")
        .uri("/inspect")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("name=John+Doe&tags=a&tags=b".to_string())
        .unwrap();

    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let seen: Inspection = body_json(resp).await;
    assert_eq!(
        seen.fields,
        vec![
            ("name".to_string(), "John Doe".to_string()),
            ("tags".to_string(), "a".to_string()),
            ("tags".to_string(), "b".to_string()),
        ]
    );
    assert!(seen.files.is_empty());
}

#[tokio::test]
async fn inspect_counts_raw_bodies() {
    let req = Request::builder()
        .method("POST")
        .uri("/inspect")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(r#"{"k":1}"#.to_string())
        .unwrap();

    let resp = app().oneshot(req).await.unwrap();
    let seen: Inspection = body_json(resp).await;
    assert_eq!(seen.body_bytes, 7);
    assert!(seen.fields.is_empty());
}

#[tokio::test]
async fn inspect_rejects_broken_multipart() {
    let req = Request::builder()
        .method("POST")
        .uri("/inspect")
        .header(http::header::CONTENT_TYPE, "multipart/form-data")
        .body("garbage".to_string())
        .unwrap();

    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

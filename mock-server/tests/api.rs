use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_path_headers_and_body() {
    let resp = app()
        .oneshot(json_request("POST", "/echo", r#"{"pageNum":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.headers["content-type"], "application/json");
    assert_eq!(echo.body, json!({ "pageNum": 1 }));
}

#[tokio::test]
async fn echo_accepts_every_verb() {
    for method in ["GET", "POST", "PUT", "DELETE"] {
        let resp = app().oneshot(empty_request(method, "/echo")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
        let echo: Echo = body_json(resp).await;
        assert_eq!(echo.method, method);
        assert_eq!(echo.body, Value::Null, "{method}: empty body");
    }
}

#[tokio::test]
async fn echo_keeps_non_json_body_as_text() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/echo")
                .body("not json".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.body, json!("not json"));
}

// --- getHi ---

#[tokio::test]
async fn get_hi_acknowledges_body() {
    let resp = app()
        .oneshot(json_request("POST", "/getHi", r#"{"pageNum":2}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = body_json(resp).await;
    assert_eq!(value, json!({ "ok": true, "received": { "pageNum": 2 } }));
}

#[tokio::test]
async fn get_hi_rejects_get() {
    let resp = app().oneshot(empty_request("GET", "/getHi")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- text ---

#[tokio::test]
async fn text_is_plain() {
    let resp = app().oneshot(empty_request("GET", "/text")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "hello, plain text");
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    for code in [200u16, 204, 404, 500, 503] {
        let resp = app()
            .oneshot(empty_request("GET", &format!("/status/{code}")))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), code);
        assert!(body_bytes(resp).await.is_empty());
    }
}

#[tokio::test]
async fn status_with_bad_code_returns_400() {
    let resp = app()
        .oneshot(empty_request("GET", "/status/not-a-code"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- slow ---

#[tokio::test]
async fn slow_answers_after_delay() {
    let started = std::time::Instant::now();
    let resp = app().oneshot(empty_request("GET", "/slow/20")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(started.elapsed() >= std::time::Duration::from_millis(20));
    let value: Value = body_json(resp).await;
    assert_eq!(value, json!({ "slept": 20 }));
}

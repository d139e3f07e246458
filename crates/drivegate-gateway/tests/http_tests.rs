//! Router-level tests: request parsing, status mapping and the
//! JSON/streaming response shapes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use drivegate_catalog::Database;
use drivegate_gateway::http::{router, AppState};
use drivegate_gateway::{Gateway, Limits};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = Database::open_in_memory().await.unwrap();
    let backend = Arc::new(db.blob_backend());
    let gateway = Arc::new(Gateway::new(
        db.credentials(),
        db.sessions(),
        db.files(),
        backend,
        Limits::default(),
    ));
    router(AppState { gateway }, 10 * 1024 * 1024)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// Register a space and return a live token.
async fn signup(app: &Router, space_id: &str, password: &str) -> String {
    let (status, _) = post_json(
        app,
        "/spaces/create",
        json!({"space_id": space_id, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        app,
        "/spaces/login",
        json!({"space_id": space_id, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn multipart_upload_request(token: &str, filename: &str, content: &[u8]) -> Request<Body> {
    const BOUNDARY: &str = "test-boundary-7b12a9";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"token\"\r\n\r\n{token}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/files/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["healthy"], true);
    assert_eq!(value["backend"], "embedded-blob");
}

#[tokio::test]
async fn test_space_validation() {
    let app = test_app().await;

    let (status, body) = post_json(
        &app,
        "/spaces/create",
        json!({"space_id": "ab", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, body) = post_json(
        &app,
        "/spaces/create",
        json!({"space_id": "alice", "password": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_duplicate_space_maps_to_400() {
    let app = test_app().await;
    signup(&app, "alice", "secret1").await;

    let (status, body) = post_json(
        &app,
        "/spaces/create",
        json!({"space_id": "alice", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_bad_login_maps_to_401() {
    let app = test_app().await;
    signup(&app, "alice", "secret1").await;

    let (status, body) = post_json(
        &app,
        "/spaces/login",
        json!({"space_id": "alice", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_upload_list_download_delete_flow() {
    let app = test_app().await;
    let token = signup(&app, "alice", "secret1").await;

    let response = app
        .clone()
        .oneshot(multipart_upload_request(&token, "notes.txt", b"hello world"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = get(&app, &format!("/files?token={token}")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["filename"], "notes.txt");
    assert_eq!(listed[0]["size"], 11);
    let id = listed[0]["id"].as_i64().unwrap();

    // Download is an opaque attachment.
    let request = Request::builder()
        .uri(format!("/files/download/{id}?token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"hello world");

    // Preview is inline with the inferred type.
    let request = Request::builder()
        .uri(format!("/files/preview/{id}?token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");

    // Delete, then the file is gone.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/files/{id}?token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = get(&app, &format!("/files/download/{id}?token={token}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = test_app().await;
    let (status, body) = get(&app, "/files?token=not-a-real-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_get_upload_url_unsupported_on_embedded() {
    let app = test_app().await;
    let token = signup(&app, "alice", "secret1").await;

    let (status, body) = post_json(
        &app,
        "/files/get-upload-url",
        json!({"token": token, "filename": "big.bin", "size": 5_000_000}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED");
}

#[tokio::test]
async fn test_confirm_foreign_locator_maps_to_403() {
    let app = test_app().await;
    let token = signup(&app, "alice", "secret1").await;

    let (status, body) = post_json(
        &app,
        "/files/confirm-upload",
        json!({
            "token": token,
            "locator": "bob/xyz123_big.bin",
            "filename": "big.bin",
            "size": 5_000_000
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_LOCATOR");

    // No catalog row appeared.
    let (status, body) = get(&app, &format!("/files?token={token}")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Value = serde_json::from_slice(&body).unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

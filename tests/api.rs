//! HTTP API tests driving the router in-process.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use draftpress::repository::StorageLayout;
use draftpress::server::{router, AppState};
use draftpress::services::SiteRebuilder;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let layout = StorageLayout::new(dir.path());
    layout.ensure().unwrap();
    let state = AppState::new(layout, SiteRebuilder::disabled(), false);
    (dir, router(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(&body.to_string())).await
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_import_then_list_and_get() {
    let (_dir, app) = app();
    let (status, body) = post(
        &app,
        "/api/documents/import",
        json!({"filename": "a.md", "content": "# Test\n\nbody"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/documents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/api/documents?status=processed", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::GET, &format!("/api/documents/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "# Test\n\nbody");
}

#[tokio::test]
async fn test_full_lifecycle() {
    let (dir, app) = app();
    let (_, body) = post(
        &app,
        "/api/documents/import",
        json!({"filename": "a.md", "content": "# Test\n\nbody"}),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/api/documents/process",
        json!({"id": id, "tags": ["x"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "processed");
    assert!(body["data"]["content"]
        .as_str()
        .unwrap()
        .contains("tags: [\"x\"]"));

    let (status, body) = post(&app, "/api/documents/publish", json!({"id": id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "published");
    let file = body["data"]["published_file"].as_str().unwrap();
    assert!(dir.path().join(file).exists());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/documents/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dir.path().join(file).exists());

    let (status, body) = send(&app, Method::GET, &format!("/api/documents/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_save_creates_document() {
    let (_dir, app) = app();
    let (status, body) = post(
        &app,
        "/api/documents/save",
        json!({"id": "draft-1", "title": "Hello", "content": "hello world"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "processed");
    assert_eq!(body["data"]["source"], "web_editor");
    assert_eq!(body["data"]["word_count"], 2);
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let (_dir, app) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/documents/import",
        Some("{ not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (_, body) = send(&app, Method::GET, "/api/documents", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_client_errors() {
    let (_dir, app) = app();
    for (uri, payload) in [
        ("/api/documents/import", json!({"filename": "a.md"})),
        ("/api/documents/save", json!({"title": "t", "content": "c"})),
        ("/api/documents/save", json!({"id": "d1", "content": "   "})),
        ("/api/documents/process", json!({"tags": ["x"]})),
        ("/api/documents/publish", json!({})),
    ] {
        let (status, body) = post(&app, uri, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_save_keeps_submitted_front_matter() {
    let (_dir, app) = app();
    let content = "---\ntitle: \"Hello\"\ntags: [\"keep\"]\ndraft: true\n---\n\nbody";
    let (status, body) = post(
        &app,
        "/api/documents/save",
        json!({"id": "draft-2", "content": content}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Hello");
    assert_eq!(body["data"]["front_matter"]["tags"], json!(["keep"]));
    assert_eq!(body["data"]["front_matter"]["draft"], true);
}

#[tokio::test]
async fn test_process_rejects_bad_date() {
    let (_dir, app) = app();
    let (_, body) = post(
        &app,
        "/api/documents/import",
        json!({"filename": "a.md", "content": "# Test\n\nbody"}),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/api/documents/process",
        json!({"id": id, "date": "2024-01-01\ndraft: true"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("date"));

    let (_, body) = send(&app, Method::GET, &format!("/api/documents/{}", id), None).await;
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn test_validation_and_not_found_mapping() {
    let (_dir, app) = app();
    let (status, _) = post(
        &app,
        "/api/documents/import",
        json!({"filename": "a.exe", "content": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/documents?status=archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/api/documents/publish",
        json!({"id": "doc_1_deadbeef"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("doc_1_deadbeef"));

    let (status, _) = post(
        &app,
        "/api/documents/process",
        json!({"id": "doc_1_deadbeef"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (_dir, app) = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/documents/import")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_image_upload_and_serve() {
    let (_dir, app) = app();
    let (status, body) = post(
        &app,
        "/api/images",
        json!({
            "filename": "pixel.gif",
            "data": "data:image/gif;base64,R0lGODlhAQABAAAAACw=",
            "category": "gallery",
            "subcategory": "screenshots",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["url"].as_str().unwrap().to_string();
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(url.starts_with("/images/gallery/screenshots/"));

    let (status, body) = send(&app, Method::GET, &format!("/api/images/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mime_type"], "image/gif");

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = post(&app, "/api/images", json!({"filename": "x.png", "data": "%%%"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rebuild_without_hook() {
    let (_dir, app) = app();
    let (status, body) = post(&app, "/api/site/rebuild", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["triggered"], false);
}

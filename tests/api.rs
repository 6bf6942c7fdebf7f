//! HTTP surface of the story API, driven through the router without a socket.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use impact_stories::api::create_router;
use impact_stories::core::{create_app_state, AppState, Config, Error, Result, StorageError};
use impact_stories::storage::{NewStory, Story, StoryId, StoryStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn app_with(configure: impl FnOnce(&mut Config)) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.data_file = dir.path().join("stories.json");
    configure(&mut config);
    let state = create_app_state(config).await.unwrap();
    (dir, create_router(state))
}

async fn app() -> (TempDir, Router) {
    app_with(|_| {}).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn story_body() -> Value {
    json!({
        "title": "T",
        "category": "C",
        "summary": "S",
        "description": "D",
        "imageUrl": "https://x/y.jpg",
        "isFeatured": true
    })
}

#[tokio::test]
async fn list_starts_empty() {
    let (_dir, app) = app().await;
    let (status, body) = send(&app, get("/stories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_then_fetch() {
    let (_dir, app) = app().await;

    let (status, created) = send(&app, post_json("/stories", story_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        created,
        json!({
            "id": 1,
            "title": "T",
            "category": "C",
            "summary": "S",
            "description": "D",
            "imageUrl": "https://x/y.jpg",
            "isFeatured": true,
            "likes": 0
        })
    );

    let (status, fetched) = send(&app, get("/stories/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, listed) = send(&app, get("/stories")).await;
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn like_increments_and_returns_story() {
    let (_dir, app) = app().await;
    send(&app, post_json("/stories", story_body())).await;

    send(&app, post("/stories/1/like")).await;
    let (status, body) = send(&app, post("/stories/1/like")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["likes"], 2);
}

#[tokio::test]
async fn concurrent_likes_over_http_are_all_counted() {
    let (_dir, app) = app().await;
    send(&app, post_json("/stories", story_body())).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.oneshot(post("/stories/1/like")).await.unwrap().status() })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, body) = send(&app, get("/stories/1")).await;
    assert_eq!(body["likes"], 20);
}

#[tokio::test]
async fn missing_story_is_404() {
    let (_dir, app) = app().await;

    let (status, body) = send(&app, get("/stories/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Story 999 not found");

    let (status, _) = send(&app, post("/stories/999/like")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, get("/stories")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn invalid_ids_are_400() {
    let (_dir, app) = app().await;

    for uri in ["/stories/abc", "/stories/0", "/stories/-3"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].as_str().unwrap().contains("positive integer"));
    }

    let (status, _) = send(&app, post("/stories/abc/like")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validation_failures_list_every_field() {
    let (_dir, app) = app().await;

    let (status, body) = send(
        &app,
        post_json("/stories", json!({"title": "  ", "imageUrl": "not-a-url"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let details = body["details"].as_object().unwrap();
    for field in ["title", "category", "summary", "description", "imageUrl"] {
        assert!(details.contains_key(field), "missing {field} in {details:?}");
    }

    let (_, listed) = send(&app, get("/stories")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn malformed_bodies_are_400() {
    let (_dir, app) = app().await;

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/stories")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let (status, body) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Malformed JSON");

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/stories")
        .body(Body::from(story_body().to_string()))
        .unwrap();
    let (status, _) = send(&app, untyped).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let wrong_type = post_json("/stories", json!({"title": 5}));
    let (status, body) = send(&app, wrong_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON data");
}

#[tokio::test]
async fn health_hides_file_path_by_default() {
    let (_dir, app) = app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], impact_stories::VERSION);
    assert!(body.get("storiesFile").is_none());
}

#[tokio::test]
async fn health_shows_file_path_when_details_are_exposed() {
    let (dir, app) = app_with(|config| config.server.expose_error_details = true).await;
    let (_, body) = send(&app, get("/health")).await;
    let expected = dir.path().join("stories.json").display().to_string();
    assert_eq!(body["storiesFile"], expected);
}

#[tokio::test]
async fn metrics_reflect_store_activity() {
    let (_dir, app) = app().await;
    send(&app, post_json("/stories", story_body())).await;
    send(&app, post("/stories/1/like")).await;
    send(&app, get("/stories/5")).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("stories_created_total 1"), "{text}");
    assert!(text.contains("stories_likes_total 1"), "{text}");
    assert!(text.contains("stories_lookups_missed_total 1"), "{text}");
}

#[tokio::test]
async fn metrics_endpoint_is_404_when_disabled() {
    let (_dir, app) = app_with(|config| config.metrics.enabled = false).await;
    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let (_dir, app) = app().await;
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/stories")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(preflight).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn cors_respects_configured_origins() {
    let (_dir, app) = app_with(|config| {
        config.server.cors_origins = vec!["https://stories.example.org".to_string()];
    })
    .await;

    let allowed = Request::builder()
        .uri("/stories")
        .header(header::ORIGIN, "https://stories.example.org")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://stories.example.org"
    );

    let other = Request::builder()
        .uri("/stories")
        .header(header::ORIGIN, "https://elsewhere.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(other).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn exhausted_id_space_is_500_and_keeps_the_document() {
    let (dir, app) = app_with(|config| {
        let document = json!({
            "stories": [{
                "id": u64::MAX, "title": "last", "category": "c", "summary": "s",
                "description": "d", "imageUrl": "https://x/y.jpg",
                "isFeatured": false, "likes": 0
            }]
        });
        std::fs::write(&config.storage.data_file, document.to_string()).unwrap();
    })
    .await;

    let (status, body) = send(&app, post_json("/stories", story_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));

    let (_, listed) = send(&app, get("/stories")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(dir.path().join("stories.json").exists());
}

/// Store whose backing file is permanently unreachable
struct UnreachableStore {
    path: PathBuf,
}

impl UnreachableStore {
    fn failure(&self) -> Error {
        StorageError::Unavailable {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        }
        .into()
    }
}

impl StoryStore for UnreachableStore {
    async fn list_all(&self) -> Result<Vec<Story>> {
        Err(self.failure())
    }

    async fn get_by_id(&self, _id: StoryId) -> Result<Option<Story>> {
        Err(self.failure())
    }

    async fn increment_likes(&self, _id: StoryId) -> Result<Option<Story>> {
        Err(self.failure())
    }

    async fn create(&self, _new: NewStory) -> Result<Story> {
        Err(self.failure())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

fn unreachable_app(expose_error_details: bool) -> Router {
    let mut config = Config::default();
    config.server.expose_error_details = expose_error_details;
    let store = UnreachableStore {
        path: PathBuf::from("/srv/secret/stories.json"),
    };
    create_router(Arc::new(AppState::new(Arc::new(store), config, None)))
}

#[tokio::test]
async fn storage_failures_are_500_without_leaking_paths() {
    let app = unreachable_app(false);

    for request in [
        get("/stories"),
        get("/stories/1"),
        post("/stories/1/like"),
        post_json("/stories", story_body()),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Story storage is unavailable"}));
    }
}

#[tokio::test]
async fn storage_failure_details_in_development_mode() {
    let app = unreachable_app(true);
    let (status, body) = send(&app, get("/stories")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["details"].as_str().unwrap().contains("/srv/secret/stories.json"));
}

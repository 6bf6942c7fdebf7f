//! HTTP request handlers for the story API
//!
//! Each handler makes exactly one store call and translates the outcome:
//! `None` becomes 404, a bad id or body 400, any store error 500.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::validation::{parse_story_id, CreateStoryRequest};
use crate::core::{AppState, Error};
use crate::storage::{Story, StoryStore};

/// Error body returned for every non-2xx response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
    /// Per-field problems, or internal details in development mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    /// Error without details
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Error with details
    pub fn with_details(error: impl Into<String>, details: Value) -> Self {
        Self {
            error: error.into(),
            details: Some(details),
        }
    }
}

/// Rejection type shared by all handlers
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Story as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    /// Story id
    pub id: u64,
    /// Headline
    pub title: String,
    /// Grouping label
    pub category: String,
    /// Teaser text
    pub summary: String,
    /// Full body
    pub description: String,
    /// Cover image URL
    pub image_url: String,
    /// Featured flag
    pub is_featured: bool,
    /// Like count
    pub likes: u64,
}

impl From<Story> for StoryResponse {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            title: story.title,
            category: story.category,
            summary: story.summary,
            description: story.description,
            image_url: story.image_url,
            is_featured: story.is_featured,
            likes: story.likes,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since startup
    pub uptime_seconds: i64,
    /// Backing file, only when error details are exposed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories_file: Option<String>,
}

/// JSON extractor that answers malformed bodies with an [`ErrorResponse`]
pub struct JsonRequest<T>(pub T);

impl<T, S> FromRequest<S> for JsonRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonRequest(value)),
            Err(rejection) => {
                let error_message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        debug!("Invalid JSON data: {}", err);
                        "Invalid JSON data"
                    }
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON",
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header. Expected 'application/json'"
                    }
                    JsonRejection::BytesRejection(_) => "Failed to read request body",
                    _ => "Invalid JSON request",
                };

                warn!("JSON parsing error: {}", error_message);
                Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error_message))))
            }
        }
    }
}

fn bad_request(err: Error) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(err.to_string())))
}

fn not_found(id: u64) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Story {} not found", id))),
    )
}

/// Map a store failure to a 500. Internal details only leave the process when
/// the server is configured to expose them.
fn store_failure(err: Error, expose_details: bool) -> ApiError {
    error!(error = %err, "Story store operation failed");
    let message = if err.is_storage_unavailable() {
        "Story storage is unavailable"
    } else {
        "Internal server error"
    };
    let body = if expose_details {
        ErrorResponse::with_details(message, json!(err.to_string()))
    } else {
        ErrorResponse::new(message)
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

/// `GET /stories`
pub async fn list_stories<S: StoryStore>(
    State(app_state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    let expose = app_state.config.server.expose_error_details;
    let stories = app_state
        .store
        .list_all()
        .await
        .map_err(|e| store_failure(e, expose))?;

    debug!(count = stories.len(), "Listed stories");
    Ok(Json(stories.into_iter().map(StoryResponse::from).collect()))
}

/// `GET /stories/{id}`
pub async fn get_story<S: StoryStore>(
    State(app_state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, ApiError> {
    let id = parse_story_id(&id).map_err(bad_request)?;
    let expose = app_state.config.server.expose_error_details;

    match app_state.store.get_by_id(id).await {
        Ok(Some(story)) => Ok(Json(story.into())),
        Ok(None) => Err(not_found(id)),
        Err(e) => Err(store_failure(e, expose)),
    }
}

/// `POST /stories/{id}/like`
pub async fn like_story<S: StoryStore>(
    State(app_state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, ApiError> {
    let id = parse_story_id(&id).map_err(bad_request)?;
    let expose = app_state.config.server.expose_error_details;

    match app_state.store.increment_likes(id).await {
        Ok(Some(story)) => {
            debug!(id, likes = story.likes, "Story liked");
            Ok(Json(story.into()))
        }
        Ok(None) => Err(not_found(id)),
        Err(e) => Err(store_failure(e, expose)),
    }
}

/// `POST /stories`
pub async fn create_story<S: StoryStore>(
    State(app_state): State<Arc<AppState<S>>>,
    JsonRequest(request): JsonRequest<CreateStoryRequest>,
) -> Result<(StatusCode, Json<StoryResponse>), ApiError> {
    let new_story = request.validate().map_err(|errors| {
        debug!(?errors, "Rejected story");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Validation failed", json!(errors))),
        )
    })?;

    let expose = app_state.config.server.expose_error_details;
    let story = app_state
        .store
        .create(new_story)
        .await
        .map_err(|e| store_failure(e, expose))?;

    info!(id = story.id, "Created story");
    Ok((StatusCode::CREATED, Json(story.into())))
}

/// `GET /health`
pub async fn health_check<S: StoryStore>(
    State(app_state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let stories_file = app_state
        .config
        .server
        .expose_error_details
        .then(|| app_state.store.location().display().to_string());

    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        uptime_seconds: app_state.uptime_seconds(),
        stories_file,
    })
}

/// `GET /metrics`
pub async fn metrics_handler<S: StoryStore>(
    State(app_state): State<Arc<AppState<S>>>,
) -> Response {
    let Some(metrics) = &app_state.metrics else {
        return (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Metrics are disabled")))
            .into_response();
    };

    match metrics.render() {
        Ok(body) => ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
                .into_response()
        }
    }
}

/// `GET /`
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": crate::NAME,
        "version": crate::VERSION,
        "status": "operational",
        "endpoints": {
            "stories": "/stories",
            "story": "/stories/{id}",
            "like": "/stories/{id}/like",
            "health": "/health",
            "metrics": "/metrics"
        }
    }))
}

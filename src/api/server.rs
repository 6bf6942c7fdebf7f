//! HTTP server implementation for the story API

use std::future::Future;
use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::handlers;
use crate::core::{AppState, Error, Result};
use crate::storage::StoryStore;

/// Creates the application router with all routes and middleware
pub fn create_router<S: StoryStore>(app_state: Arc<AppState<S>>) -> Router {
    let cors = cors_layer(&app_state.config.server.cors_origins);

    Router::new()
        .route("/", get(handlers::root_handler))
        // Story routes
        .route(
            "/stories",
            get(handlers::list_stories::<S>).post(handlers::create_story::<S>),
        )
        .route("/stories/{id}", get(handlers::get_story::<S>))
        .route("/stories/{id}/like", post(handlers::like_story::<S>))
        // System routes
        .route("/health", get(handlers::health_check::<S>))
        .route("/metrics", get(handlers::metrics_handler::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn start_api_server<S, F>(app_state: Arc<AppState<S>>, shutdown: F) -> Result<()>
where
    S: StoryStore,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = app_state.config.server.http_addr;
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Cannot bind HTTP server to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);
    info!("Stories available at http://{}/stories", addr);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::internal(format!("HTTP server failed: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}

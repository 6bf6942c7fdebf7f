//! # API Module
//!
//! HTTP gateway in front of the story store.
//!
//! ## Endpoints
//!
//! - `GET /stories` - List all stories in creation order
//! - `GET /stories/{id}` - Get one story
//! - `POST /stories` - Create a story (201)
//! - `POST /stories/{id}/like` - Add a like and return the updated story
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics, when enabled

/// HTTP request handlers
pub mod handlers;

/// Router and server startup
pub mod server;

/// Request validation
pub mod validation;

// Re-export commonly used items
pub use server::{create_router, start_api_server};

//! Impact Stories - a small REST backend for impact story records
//!
//! Stories are kept in a single JSON document on disk. The [`storage`] module
//! owns that file and serializes every read-modify-write through one lock;
//! the [`api`] module exposes it over HTTP.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod storage;
pub mod api;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Error, Result};
pub use crate::storage::{FileStore, NewStory, Story, StoryId, StoryStore};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

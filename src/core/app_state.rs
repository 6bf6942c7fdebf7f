//! Application State Management
//!
//! The central AppState holds the one story store instance plus the
//! configuration and metrics the HTTP layer needs. It is built once by the
//! factory and handed to the router; nothing looks it up globally.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::Config;
use crate::storage::StoryStore;
use crate::system::StoreMetrics;

/// Central application state holding all services and components
pub struct AppState<S: StoryStore> {
    /// Story store shared by all request handlers
    pub store: Arc<S>,

    /// Application configuration
    pub config: Config,

    /// Store metrics, when enabled
    pub metrics: Option<Arc<StoreMetrics>>,

    /// When this state was built
    pub started_at: DateTime<Utc>,
}

impl<S: StoryStore> AppState<S> {
    /// Create a new AppState around an already opened store
    pub fn new(store: Arc<S>, config: Config, metrics: Option<Arc<StoreMetrics>>) -> Self {
        Self {
            store,
            config,
            metrics,
            started_at: Utc::now(),
        }
    }

    /// Seconds since the state was built
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

impl<S: StoryStore> std::fmt::Debug for AppState<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("metrics_enabled", &self.metrics.is_some())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

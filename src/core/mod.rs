//! Core application logic and configuration

/// Error types
pub mod error;

/// Application configuration
pub mod config;

/// Logging setup
pub mod logging;

/// Application state management
pub mod app_state;

/// Factory pattern for app creation
pub mod factory;

// Re-export commonly used items
pub use app_state::AppState;
pub use config::{load_config, load_config_or_default, Config};
pub use error::{Error, Result, StorageError};
pub use factory::create_app_state;
pub use logging::init_logging;

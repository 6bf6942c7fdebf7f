//! Application Factory
//!
//! Builds the [`AppState`] from configuration: metrics first, then the file
//! store with the metrics attached as its observer.

use std::sync::Arc;

use crate::core::app_state::AppState;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::storage::{FileStore, StoreObserver};
use crate::system::StoreMetrics;

/// Create AppState based on configuration
///
/// # Errors
///
/// * `Error::Config` - the configured data file path is empty
/// * `Error::Storage` - the data file could not be created
/// * `Error::Metrics` - metric registration failed
pub async fn create_app_state(config: Config) -> Result<Arc<AppState<FileStore>>> {
    tracing::info!("Creating AppState with data file {}", config.storage.data_file.display());

    let metrics = if config.metrics.enabled {
        Some(Arc::new(StoreMetrics::new()?))
    } else {
        None
    };
    let observer = metrics
        .clone()
        .map(|metrics| metrics as Arc<dyn StoreObserver>);

    let store = FileStore::open_with(
        config.storage.data_file.clone(),
        config.storage.store_options(),
        observer,
    )
    .await?;

    tracing::info!("AppState created successfully");
    Ok(Arc::new(AppState::new(Arc::new(store), config, metrics)))
}

//! Prometheus metrics for the story store
//!
//! Each [`StoreMetrics`] owns its registry, so several instances (one per
//! test, say) never collide on metric names.

use prometheus::{IntCounter, IntGauge, Registry, TextEncoder};

use crate::core::Result;
use crate::storage::{StoreEvent, StoreObserver};

/// Counters fed by store events
pub struct StoreMetrics {
    registry: Registry,
    /// Total number of stories created
    pub stories_created: IntCounter,
    /// Total number of likes recorded
    pub likes_recorded: IntCounter,
    /// Lookups for ids that do not exist
    pub lookups_missed: IntCounter,
    /// Document writes that completed
    pub documents_persisted: IntCounter,
    /// Malformed documents replaced by an empty collection
    pub documents_recovered: IntCounter,
    /// Operations that failed with a storage error
    pub storage_failures: IntCounter,
    /// Stories in the document as of the last read or write
    pub stories: IntGauge,
}

impl StoreMetrics {
    /// Create and register all store metrics
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("stories".to_string()), None)?;

        let stories_created = IntCounter::new("created_total", "Total number of stories created")?;
        let likes_recorded = IntCounter::new("likes_total", "Total number of likes recorded")?;
        let lookups_missed = IntCounter::new(
            "lookups_missed_total",
            "Total number of lookups for story ids that do not exist",
        )?;
        let documents_persisted = IntCounter::new(
            "documents_persisted_total",
            "Total number of story document writes",
        )?;
        let documents_recovered = IntCounter::new(
            "documents_recovered_total",
            "Total number of malformed documents treated as empty",
        )?;
        let storage_failures = IntCounter::new(
            "storage_failures_total",
            "Total number of store operations that failed",
        )?;
        let stories = IntGauge::new("count", "Number of stories in the document")?;

        registry.register(Box::new(stories_created.clone()))?;
        registry.register(Box::new(likes_recorded.clone()))?;
        registry.register(Box::new(lookups_missed.clone()))?;
        registry.register(Box::new(documents_persisted.clone()))?;
        registry.register(Box::new(documents_recovered.clone()))?;
        registry.register(Box::new(storage_failures.clone()))?;
        registry.register(Box::new(stories.clone()))?;

        Ok(Self {
            registry,
            stories_created,
            likes_recorded,
            lookups_missed,
            documents_persisted,
            documents_recovered,
            storage_failures,
            stories,
        })
    }

    /// Registry holding the store metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Collect and return all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

impl StoreObserver for StoreMetrics {
    fn observe(&self, event: &StoreEvent<'_>) {
        match event {
            StoreEvent::Opened { .. } => {}
            StoreEvent::Loaded { stories } => self.stories.set(*stories as i64),
            StoreEvent::Persisted { stories } => {
                self.documents_persisted.inc();
                self.stories.set(*stories as i64);
            }
            StoreEvent::Recovered { .. } => self.documents_recovered.inc(),
            StoreEvent::Created(_) => self.stories_created.inc(),
            StoreEvent::Liked(_) => self.likes_recorded.inc(),
            StoreEvent::Missing { .. } => self.lookups_missed.inc(),
            StoreEvent::Failed { .. } => self.storage_failures.inc(),
        }
    }
}

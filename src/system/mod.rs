//! System-level services: metrics

/// Prometheus metrics for store activity
pub mod metrics;

pub use metrics::StoreMetrics;

//! Backpressure configuration for the scan event bus.

use serde::{Deserialize, Serialize};

/// The bus has one delivery mode: drop-oldest via `broadcast`'s own lagged-
/// receiver semantics. Kept as an enum (rather than removed outright) since
/// `EventBusConfig` is the place a blocking or error-on-full mode would be
/// added if a future sink ever needed one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum BackpressureMode {
    #[default]
    DropOldest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    pub capacity: usize,
    pub backpressure_mode: BackpressureMode,
    pub overload_threshold: f64,
    pub enable_batching: bool,
    pub max_batch_size: usize,
    pub batch_timeout_ms: u64,
    pub enable_metrics: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            backpressure_mode: BackpressureMode::DropOldest,
            overload_threshold: 0.8,
            enable_batching: false,
            max_batch_size: 100,
            batch_timeout_ms: 100,
            enable_metrics: true,
        }
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

use crate::events::config::EventBusConfig;
use crate::events::metrics::EventBusMetrics;

/// Broadcast-backed event bus for scan progress. A slow or absent subscriber
/// must never block scanning: `publish` always succeeds from the caller's
/// point of view, tracking an absent-subscriber send as a drop rather than
/// an error.
#[derive(Debug)]
pub struct ScanEventBus {
    pub(super) sender: broadcast::Sender<crate::events::types::ScanEvent>,
    pub(super) config: Arc<EventBusConfig>,
    pub(super) metrics: EventBusMetrics,
    pub(super) shutdown: Arc<Notify>,
    pub(super) shutdown_flag: Arc<AtomicBool>,
    pub(super) num_instances: Arc<AtomicUsize>,
}

impl ScanEventBus {
    pub fn new(capacity: usize) -> Self {
        Self::with_config(EventBusConfig { capacity, ..EventBusConfig::default() })
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        Self {
            sender,
            config: Arc::new(config),
            metrics: EventBusMetrics::default(),
            shutdown: Arc::new(Notify::new()),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            num_instances: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EventBusMetrics {
        &self.metrics
    }
}

pub mod bus;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod types;

pub use bus::ScanEventBus;
pub use config::{BackpressureMode, EventBusConfig};
pub use errors::EventBusError;
pub use metrics::EventBusMetrics;
pub use types::{ScanEvent, ShutdownReason};

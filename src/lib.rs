//! Cookie and web-storage compliance scanner.
//!
//! Drives headless browser sessions against a target domain, extracts every
//! cookie and storage entry observed, deduplicates across pages, and
//! classifies each cookie into Necessary/Functional/Analytics/Advertising.
//! Scales from a handful of pages (Quick/Deep) to tens of thousands
//! (Enterprise, via a fixed browser pool with chunking and checkpointing),
//! and can be driven on a schedule with cross-instance mutual exclusion.

pub mod browser_pool;
pub mod browser_profile;
pub mod browser_setup;
pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod page_visitor;
pub mod scanner;
pub mod schedule;
pub mod utils;

pub use config::{MissingDomain, ScanConfig, ScanRequestBuilder, WithDomain};
pub use error::ScanError;
pub use events::{ScanEvent, ScanEventBus};
pub use model::{ClassifiedCookie, ScanMode, ScanResult};
pub use scanner::{run_scan, CancellationToken};

/// Installs a `tracing-subscriber` `EnvFilter` reading `RUST_LOG`, defaulting
/// to `info` if unset. Call once from a binary's `main`; library consumers
/// embedding this crate into their own process are expected to configure
/// their own subscriber instead.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_builds_a_valid_config() {
        let config = ScanRequestBuilder::<MissingDomain>::new()
            .domain("https://example.com")
            .max_pages(10)
            .build()
            .expect("valid scan request");
        assert_eq!(config.domain, "https://example.com");
    }
}

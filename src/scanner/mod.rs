//! Scan execution: dispatches a validated [`ScanConfig`] to the Parallel
//! Page Scanner or the Enterprise Scanner according to its `mode`.

pub mod aggregate;
pub mod cancellation;
pub mod enterprise;
pub mod parallel;
pub mod scan_id;

use anyhow::Result;

use crate::checkpoint::CheckpointStore;
use crate::config::ScanConfig;
use crate::events::ScanEventBus;
use crate::model::{ScanMode, ScanResult};

pub use cancellation::CancellationToken;

/// Runs a scan per `config.mode`. Enterprise scans consult `checkpoint_store`
/// for persistence and resumption; the other modes ignore it. `cancel` is
/// polled before scheduling each new page; a cancelled scan returns whatever
/// partial `ScanResult` it had accumulated with `cancelled` set.
pub async fn run_scan(
    config: &ScanConfig,
    bus: &ScanEventBus,
    checkpoint_store: &CheckpointStore,
    cancel: &CancellationToken,
) -> Result<ScanResult> {
    match config.mode {
        ScanMode::Quick => parallel::quick_scan(config, bus, cancel).await,
        ScanMode::Deep => parallel::deep_scan(config, bus, cancel).await,
        ScanMode::Enterprise => enterprise::enterprise_deep_scan(config, bus, checkpoint_store, cancel).await,
    }
}

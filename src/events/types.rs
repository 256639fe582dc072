//! Event type definitions for the scan progress stream.

use serde::{Deserialize, Serialize};

use crate::model::{ScanMetrics, ScanProgress};

/// Reason for event bus shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShutdownReason {
    ScanCompleted,
    Error(String),
    Cancelled,
}

/// Events emitted during a scan, consumed by a progress sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    ScanStarted {
        scan_id: String,
        domain: String,
        total_pages: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    BatchCompleted {
        scan_id: String,
        progress: ScanProgress,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    ChunkCompleted {
        scan_id: String,
        metrics: ScanMetrics,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    ScheduleExecutionRecorded {
        schedule_id: String,
        execution_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    ScanCompleted {
        scan_id: String,
        total_pages: usize,
        unique_cookies: usize,
        duration: std::time::Duration,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    Shutdown {
        reason: ShutdownReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ScanEvent {
    #[must_use]
    pub fn scan_started(scan_id: String, domain: String, total_pages: usize) -> Self {
        Self::ScanStarted {
            scan_id,
            domain,
            total_pages,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn batch_completed(scan_id: String, progress: ScanProgress) -> Self {
        Self::BatchCompleted {
            scan_id,
            progress,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn chunk_completed(scan_id: String, metrics: ScanMetrics) -> Self {
        Self::ChunkCompleted {
            scan_id,
            metrics,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn scan_completed(scan_id: String, total_pages: usize, unique_cookies: usize, duration: std::time::Duration) -> Self {
        Self::ScanCompleted {
            scan_id,
            total_pages,
            unique_cookies,
            duration,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn shutdown(reason: ShutdownReason) -> Self {
        Self::Shutdown {
            reason,
            timestamp: chrono::Utc::now(),
        }
    }
}

//! Error taxonomy.
//!
//! Two layers, matching the split this codebase already uses elsewhere:
//! `anyhow::Result` for internal plumbing that only needs context attached,
//! and [`ScanError`] as the public, matchable taxonomy a caller or the
//! retry/propagation logic branches on.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("extraction failed on {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("browser fatal: {0}")]
    BrowserFatal(String),

    #[error("browser pool exhausted: {healthy}/{total} slots healthy")]
    PoolExhausted { healthy: usize, total: usize },

    #[error("lock backend unavailable: {0}")]
    LockUnavailable(String),

    #[error("lock not acquired for {resource_id}")]
    LockNotAcquired { resource_id: String },

    #[error("invalid scan request: {0}")]
    Validation(String),
}

/// Coarse classification used by the Page Visitor's retry loop, mirroring the
/// `FailureKind::classify`/`is_retryable` split this codebase uses elsewhere
/// for crawl failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Dns,
    Tls,
    HttpFetch,
    Extraction,
    Fatal,
    Other,
}

impl FailureKind {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            FailureKind::Timeout
        } else if lower.contains("dns") || lower.contains("name resolution") {
            FailureKind::Dns
        } else if lower.contains("tls") || lower.contains("certificate") || lower.contains("ssl") {
            FailureKind::Tls
        } else if lower.contains("net::err") || lower.contains("http") || lower.contains("fetch") {
            FailureKind::HttpFetch
        } else if lower.contains("evaluate") || lower.contains("storage") || lower.contains("cookie") {
            FailureKind::Extraction
        } else if lower.contains("closed") || lower.contains("crashed") || lower.contains("disconnected") {
            FailureKind::Fatal
        } else {
            FailureKind::Other
        }
    }

    /// Navigation-class failures are retried; extraction/fatal failures are not
    /// (per the propagation policy: extraction errors are non-retryable).
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::Timeout | FailureKind::Dns | FailureKind::Tls | FailureKind::HttpFetch
        )
    }

    /// Exponential backoff with a fixed base, capped, used between retries of
    /// the same page.
    pub fn retry_delay(self, attempt: u32) -> Duration {
        let base_ms: u64 = match self {
            FailureKind::Timeout => 500,
            FailureKind::Dns | FailureKind::Tls => 1000,
            _ => 250,
        };
        let capped_exp = attempt.min(5);
        Duration::from_millis(base_ms.saturating_mul(1u64 << capped_exp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeout_as_retryable() {
        let kind = FailureKind::classify("Navigation timeout of 30000 ms exceeded");
        assert_eq!(kind, FailureKind::Timeout);
        assert!(kind.is_retryable());
    }

    #[test]
    fn classifies_extraction_as_non_retryable() {
        let kind = FailureKind::classify("failed to evaluate cookie extraction script");
        assert_eq!(kind, FailureKind::Extraction);
        assert!(!kind.is_retryable());
    }

    #[test]
    fn retry_delay_grows_with_attempt() {
        let k = FailureKind::Timeout;
        assert!(k.retry_delay(2) > k.retry_delay(0));
    }
}

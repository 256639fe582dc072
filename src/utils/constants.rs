//! Shared configuration constants for the scanner.
//!
//! This module contains default values used throughout the codebase to
//! ensure consistency and avoid magic numbers scattered across modules.

/// Chrome user agent string applied by stealth hardening and used as a scan default.
///
/// Updated: 2025-01-29 to Chrome 132 (current stable). Chrome releases new
/// stable versions roughly every 4 weeks; update this quarterly.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Default per-page navigation timeout, milliseconds.
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 30_000;

/// Default per-page retry budget for navigation failures.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default concurrent page visits for the parallel (non-enterprise) scanner.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default browser pool width (P) for enterprise scans.
pub const DEFAULT_BROWSER_POOL_SIZE: usize = 5;

/// Default pages-per-browser (K) for enterprise scans.
pub const DEFAULT_PAGES_PER_BROWSER: usize = 20;

/// Default chunk size for enterprise scans.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Hard ceiling on pages per enterprise scan.
pub const MAX_PAGES_ENTERPRISE: usize = 20_000;

/// Default checkpoint cadence, in completed pages.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 100;

/// Default consent-accept selector tried before giving up.
pub const DEFAULT_ACCEPT_SELECTOR: &str = "button:has-text(\"Accept\")";

/// Default distributed-lock TTL, seconds.
pub const DEFAULT_LOCK_TTL_SECONDS: u64 = 300;

/// Classifier confidence bands, carried over from the original model's
/// inference thresholds.
pub const CONFIDENCE_HIGH: f64 = 0.75;
pub const CONFIDENCE_MEDIUM: f64 = 0.50;
pub const CONFIDENCE_LOW: f64 = 0.40;

/// Cookie duration buckets, days.
pub const DURATION_SHORT_DAYS: i64 = 30;
pub const DURATION_LONG_DAYS: i64 = 365;

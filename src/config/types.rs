//! Validated scan configuration, the typestate builder's `build()` output.

use crate::model::ScanMode;
use crate::utils::constants::*;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub domain: String,
    pub mode: ScanMode,
    pub max_pages: usize,
    pub concurrency: usize,
    pub browser_pool_size: usize,
    pub pages_per_browser: usize,
    pub chunk_size: usize,
    pub custom_pages: Vec<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub accept_selector: String,
    pub user_agent: String,
    pub enable_persistence: bool,
    pub checkpoint_interval: usize,
    pub resume_scan_id: Option<String>,
    pub adaptive_concurrency: bool,
}

impl ScanConfig {
    /// Host component of `domain`, used as the scan-target host for
    /// first/third-party cookie classification. `build()` already validated
    /// `domain` parses as an absolute http/https URL, so this never fails.
    pub fn domain_host(&self) -> String {
        url::Url::parse(&self.domain)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Environment-derived defaults, read once by callers that want
/// `SCAN_*`-prefixed overrides rather than hardcoded values. The core never
/// reads the environment itself mid-scan; this is purely a convenience
/// constructor for embedding binaries.
#[derive(Debug, Clone)]
pub struct ScanConfigDefaults {
    pub concurrency: usize,
    pub browser_pool_size: usize,
    pub pages_per_browser: usize,
    pub checkpoint_dir: std::path::PathBuf,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub lock_ttl_seconds: u64,
}

impl Default for ScanConfigDefaults {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            browser_pool_size: DEFAULT_BROWSER_POOL_SIZE,
            pages_per_browser: DEFAULT_PAGES_PER_BROWSER,
            checkpoint_dir: std::path::PathBuf::from("./scan_checkpoints"),
            timeout_ms: DEFAULT_PAGE_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            lock_ttl_seconds: DEFAULT_LOCK_TTL_SECONDS,
        }
    }
}

impl ScanConfigDefaults {
    pub fn from_env() -> Self {
        let mut defaults = Self::default();
        if let Some(v) = env_usize("SCAN_DEFAULT_CONCURRENCY") {
            defaults.concurrency = v;
        }
        if let Some(v) = env_usize("SCAN_BROWSER_POOL_SIZE") {
            defaults.browser_pool_size = v;
        }
        if let Some(v) = env_usize("SCAN_PAGES_PER_BROWSER") {
            defaults.pages_per_browser = v;
        }
        if let Ok(v) = std::env::var("SCAN_CHECKPOINT_DIR") {
            defaults.checkpoint_dir = std::path::PathBuf::from(v);
        }
        if let Some(v) = env_u64("SCAN_TIMEOUT_MS") {
            defaults.timeout_ms = v;
        }
        if let Some(v) = env_u32("SCAN_MAX_RETRIES") {
            defaults.max_retries = v;
        }
        if let Some(v) = env_u64("LOCK_TTL_SECONDS") {
            defaults.lock_ttl_seconds = v;
        }
        defaults
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

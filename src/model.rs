//! Data model: the record shapes that flow between Page Visitor, the
//! scanners, the classifier, and the schedule coordinator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieExpiry {
    Session,
    At(i64),
}

impl CookieExpiry {
    pub fn is_expired(self, now: DateTime<Utc>) -> bool {
        match self {
            CookieExpiry::Session => false,
            CookieExpiry::At(ts) => ts <= now.timestamp(),
        }
    }

    pub fn duration_days(self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            CookieExpiry::Session => None,
            CookieExpiry::At(ts) => Some(((ts - now.timestamp()).max(0)) / 86_400),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieObservation {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: CookieExpiry,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub size: usize,
    /// True if this cookie was not present in the jar before the consent
    /// banner was clicked but appeared after — a signal the classifier weighs
    /// against the cookie being strictly necessary.
    pub set_after_accept: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSnapshot {
    pub local_storage: HashMap<String, String>,
    pub session_storage: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub success: bool,
    pub cookies: Vec<CookieObservation>,
    pub storage: StorageSnapshot,
    pub duration_seconds: f64,
    pub retries: u32,
    pub error: Option<String>,
}

impl PageResult {
    pub fn failed(url: impl Into<String>, error: impl Into<String>, retries: u32, duration_seconds: f64) -> Self {
        Self {
            url: url.into(),
            success: false,
            cookies: Vec::new(),
            storage: StorageSnapshot::default(),
            duration_seconds,
            retries,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedCookie {
    pub name: String,
    pub domain: String,
    pub path: String,
    pub expires: CookieExpiry,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub size: usize,
    pub set_after_accept: bool,
    pub found_on_pages: Vec<String>,
}

impl AggregatedCookie {
    pub fn identity_key(&self) -> (String, String) {
        (self.name.clone(), self.domain.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieCategory {
    Necessary,
    Functional,
    Analytics,
    Advertising,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationSource {
    Override,
    Rule,
    VendorList,
    Ml,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedCookie {
    #[serde(flatten)]
    pub cookie: AggregatedCookie,
    pub category: CookieCategory,
    pub confidence: f64,
    pub source: ClassificationSource,
    pub evidence: Vec<String>,
    pub requires_review: bool,
}

impl ClassifiedCookie {
    pub fn identity_key(&self) -> (String, String) {
        self.cookie.identity_key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    Quick,
    Deep,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanMetrics {
    pub total_pages: usize,
    pub scanned: usize,
    pub successful: usize,
    pub failed: usize,
    pub cookies_found: usize,
    pub elapsed_seconds: f64,
    pub pages_per_second: f64,
    pub estimated_remaining_seconds: f64,
    pub active_browsers: usize,
    pub current_concurrency: usize,
    pub errors_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    pub domain: String,
    pub scan_mode: ScanMode,
    pub total_pages_scanned: usize,
    pub failed_pages_count: usize,
    pub unique_cookies: usize,
    pub cookies: Vec<ClassifiedCookie>,
    pub storages: StorageSnapshot,
    pub pages_visited: Vec<String>,
    pub pages_failed: Vec<PageFailure>,
    pub duration_seconds: f64,
    pub pages_per_second: f64,
    pub metrics: ScanMetrics,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    pub total_pages: usize,
    pub scanned_pages: usize,
    pub current_batch: usize,
    pub total_batches: usize,
    pub cookies_found: usize,
    pub elapsed_seconds: f64,
    pub estimated_remaining_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanType {
    Quick,
    Deep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Cron,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeConfig {
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub cron_expression: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanParams {
    pub max_pages: Option<usize>,
    pub custom_pages: Vec<String>,
    pub chunk_size: Option<usize>,
    pub accept_selector: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: String,
    pub domain_config_id: String,
    pub domain: String,
    pub scan_type: ScanType,
    pub scan_params: ScanParams,
    pub frequency: ScheduleFrequency,
    pub time_config: TimeConfig,
    pub enabled: bool,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: Option<ScheduleStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleExecution {
    pub execution_id: String,
    pub schedule_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
    pub scan_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub scan_id: String,
    pub domain: String,
    pub total_urls: usize,
    pub completed_urls: Vec<String>,
    pub pending_urls: Vec<String>,
    pub cookies: Vec<AggregatedCookie>,
    pub metrics: ScanMetrics,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn is_consistent(&self) -> bool {
        let completed: std::collections::HashSet<_> = self.completed_urls.iter().collect();
        let pending: std::collections::HashSet<_> = self.pending_urls.iter().collect();
        completed.is_disjoint(&pending) && completed.len() + pending.len() <= self.total_urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_cookie_is_detected() {
        let now = Utc::now();
        let past = CookieExpiry::At(now.timestamp() - 10);
        assert!(past.is_expired(now));
    }

    #[test]
    fn session_cookie_never_expires() {
        let now = Utc::now();
        assert!(!CookieExpiry::Session.is_expired(now));
    }

    #[test]
    fn checkpoint_consistency_rejects_overlap() {
        let cp = Checkpoint {
            scan_id: "s".into(),
            domain: "example.com".into(),
            total_urls: 2,
            completed_urls: vec!["a".into()],
            pending_urls: vec!["a".into()],
            cookies: vec![],
            metrics: ScanMetrics::default(),
            timestamp: Utc::now(),
        };
        assert!(!cp.is_consistent());
    }
}

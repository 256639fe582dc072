//! Typestate builder for [`ScanConfig`], mirroring the marker-type pattern
//! this codebase uses for its crawl config: `domain` is a required
//! transition, everything else has a default and is clamped in `build()`.

use std::marker::PhantomData;

use crate::config::types::{ScanConfig, ScanConfigDefaults};
use crate::error::ScanError;
use crate::model::ScanMode;
use crate::utils::constants::*;

/// Marker: domain has not been set yet. `build()` is unavailable here.
pub struct MissingDomain;
/// Marker: domain has been set. `build()` is available.
pub struct WithDomain;

pub struct ScanRequestBuilder<State> {
    domain: Option<String>,
    mode: ScanMode,
    max_pages: usize,
    concurrency: usize,
    browser_pool_size: usize,
    pages_per_browser: usize,
    chunk_size: usize,
    custom_pages: Vec<String>,
    timeout_ms: u64,
    max_retries: u32,
    accept_selector: String,
    user_agent: String,
    enable_persistence: bool,
    checkpoint_interval: usize,
    resume_scan_id: Option<String>,
    adaptive_concurrency: bool,
    _state: PhantomData<State>,
}

impl ScanRequestBuilder<MissingDomain> {
    pub fn new() -> Self {
        Self::from_defaults(ScanConfigDefaults::default())
    }

    pub fn from_defaults(defaults: ScanConfigDefaults) -> Self {
        Self {
            domain: None,
            mode: ScanMode::Quick,
            max_pages: 1,
            concurrency: defaults.concurrency,
            browser_pool_size: defaults.browser_pool_size,
            pages_per_browser: defaults.pages_per_browser,
            chunk_size: DEFAULT_CHUNK_SIZE,
            custom_pages: Vec::new(),
            timeout_ms: defaults.timeout_ms,
            max_retries: defaults.max_retries,
            accept_selector: DEFAULT_ACCEPT_SELECTOR.to_string(),
            user_agent: CHROME_USER_AGENT.to_string(),
            enable_persistence: false,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            resume_scan_id: None,
            adaptive_concurrency: false,
            _state: PhantomData,
        }
    }

    /// Required transition: sets the scan target and moves to `WithDomain`.
    pub fn domain(self, domain: impl Into<String>) -> ScanRequestBuilder<WithDomain> {
        ScanRequestBuilder {
            domain: Some(domain.into()),
            mode: self.mode,
            max_pages: self.max_pages,
            concurrency: self.concurrency,
            browser_pool_size: self.browser_pool_size,
            pages_per_browser: self.pages_per_browser,
            chunk_size: self.chunk_size,
            custom_pages: self.custom_pages,
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
            accept_selector: self.accept_selector,
            user_agent: self.user_agent,
            enable_persistence: self.enable_persistence,
            checkpoint_interval: self.checkpoint_interval,
            resume_scan_id: self.resume_scan_id,
            adaptive_concurrency: self.adaptive_concurrency,
            _state: PhantomData,
        }
    }
}

impl Default for ScanRequestBuilder<MissingDomain> {
    fn default() -> Self {
        Self::new()
    }
}

/// Any-state methods: usable before or after `domain()` is set.
impl<State> ScanRequestBuilder<State> {
    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.max_pages = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn browser_pool_size(mut self, n: usize) -> Self {
        self.browser_pool_size = n;
        self
    }

    pub fn pages_per_browser(mut self, n: usize) -> Self {
        self.pages_per_browser = n;
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n;
        self
    }

    pub fn custom_pages(mut self, pages: Vec<String>) -> Self {
        self.custom_pages = pages;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn accept_selector(mut self, selector: impl Into<String>) -> Self {
        self.accept_selector = selector.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn enable_persistence(mut self, enabled: bool) -> Self {
        self.enable_persistence = enabled;
        self
    }

    pub fn checkpoint_interval(mut self, n: usize) -> Self {
        self.checkpoint_interval = n;
        self
    }

    pub fn resume_scan_id(mut self, id: impl Into<String>) -> Self {
        self.resume_scan_id = Some(id.into());
        self
    }

    pub fn adaptive_concurrency(mut self, enabled: bool) -> Self {
        self.adaptive_concurrency = enabled;
        self
    }
}

impl ScanRequestBuilder<WithDomain> {
    /// Validates and clamps every field per the documented bounds, returning
    /// an error for anything that cannot be sanely clamped (an unparsable
    /// domain).
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let parsed = url::Url::parse(&self.domain.clone().unwrap_or_default())
            .map_err(|e| ScanError::Validation(format!("invalid domain url: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScanError::Validation(format!(
                "unsupported scheme '{}', expected http or https",
                parsed.scheme()
            )));
        }

        Ok(ScanConfig {
            domain: self.domain.expect("domain set by typestate"),
            mode: self.mode,
            max_pages: self.max_pages.clamp(1, MAX_PAGES_ENTERPRISE),
            concurrency: self.concurrency.clamp(1, 20),
            browser_pool_size: self.browser_pool_size.clamp(1, 10),
            pages_per_browser: self.pages_per_browser.clamp(1, 50),
            chunk_size: self.chunk_size.clamp(100, 2000),
            custom_pages: self.custom_pages,
            timeout_ms: self.timeout_ms.clamp(5_000, 120_000),
            max_retries: self.max_retries,
            accept_selector: self.accept_selector,
            user_agent: self.user_agent,
            enable_persistence: self.enable_persistence,
            checkpoint_interval: self.checkpoint_interval.max(1),
            resume_scan_id: self.resume_scan_id,
            adaptive_concurrency: self.adaptive_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_domain_typestate() {
        let cfg = ScanRequestBuilder::new()
            .domain("https://example.com")
            .max_pages(50_000)
            .concurrency(0)
            .build()
            .expect("valid");
        assert_eq!(cfg.max_pages, MAX_PAGES_ENTERPRISE);
        assert_eq!(cfg.concurrency, 1);
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ScanRequestBuilder::new().domain("ftp://example.com").build();
        assert!(err.is_err());
    }
}

//! Page Visitor: the unit of work a scanner hands one page to. Navigates,
//! best-effort dismisses a consent banner, waits for the page to settle,
//! extracts cookies and web storage, and guarantees the page is closed on
//! every exit path — success, retryable failure, or panic-safe early return.
//!
//! Cookies are read once before the consent click and once after settling;
//! any name absent from the first read is flagged `set_after_accept` so the
//! classifier can weigh banner-triggered cookies differently from ones
//! already present on load.

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use tracing::{debug, warn};

use crate::error::FailureKind;
use crate::model::{CookieExpiry, CookieObservation, PageResult, SameSite, StorageSnapshot};

const STORAGE_SCRIPT: &str = r#"
(() => {
    const toObject = (storage) => {
        const out = {};
        for (let i = 0; i < storage.length; i++) {
            const key = storage.key(i);
            out[key] = storage.getItem(key);
        }
        return out;
    };
    return {
        local: toObject(window.localStorage),
        session: toObject(window.sessionStorage),
    };
})()
"#;

#[derive(Debug, serde::Deserialize)]
struct RawStorage {
    local: std::collections::HashMap<String, String>,
    session: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct VisitConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub accept_selector: String,
    pub settle_wait: Duration,
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(crate::utils::constants::DEFAULT_PAGE_TIMEOUT_MS),
            max_retries: crate::utils::constants::DEFAULT_MAX_RETRIES,
            accept_selector: crate::utils::constants::DEFAULT_ACCEPT_SELECTOR.to_string(),
            settle_wait: Duration::from_millis(500),
        }
    }
}

/// Visits one URL against an already-acquired browser, retrying navigation
/// failures up to `config.max_retries` times. Extraction failures are not
/// retried — a page that loaded but whose cookie jar we couldn't read is a
/// page we report as failed, not one we hammer again.
pub async fn visit(browser: &chromiumoxide::Browser, url: &str, config: &VisitConfig) -> PageResult {
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        match visit_once(browser, url, config).await {
            Ok(result) => return result,
            Err((kind, message)) => {
                if !kind.is_retryable() || attempt >= config.max_retries {
                    warn!("giving up on {} after {} attempt(s): {}", url, attempt + 1, message);
                    return PageResult::failed(url, message, attempt, start.elapsed().as_secs_f64());
                }
                debug!("retrying {} (attempt {}) after {:?} failure: {}", url, attempt + 1, kind, message);
                tokio::time::sleep(kind.retry_delay(attempt)).await;
                attempt += 1;
            }
        }
    }
}

async fn visit_once(
    browser: &chromiumoxide::Browser,
    url: &str,
    config: &VisitConfig,
) -> Result<PageResult, (FailureKind, String)> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| (FailureKind::classify(&e.to_string()), e.to_string()))?;

    // Close the page on every exit path, including the early returns below.
    let result = visit_page(&page, url, config).await;
    if let Err(e) = page.close().await {
        warn!("failed to close page for {}: {}", url, e);
    }
    result
}

async fn visit_page(
    page: &Page,
    url: &str,
    config: &VisitConfig,
) -> Result<PageResult, (FailureKind, String)> {
    let start = Instant::now();

    if let Err(e) = crate::browser_setup::apply_stealth_measures(page).await {
        debug!("stealth measures failed for {} (continuing anyway): {}", url, e);
    }

    tokio::time::timeout(config.timeout, page.goto(url))
        .await
        .map_err(|_| (FailureKind::Timeout, format!("navigation timeout after {:?}", config.timeout)))?
        .map_err(|e| (FailureKind::classify(&e.to_string()), e.to_string()))?;

    tokio::time::timeout(config.timeout, page.wait_for_navigation())
        .await
        .map_err(|_| (FailureKind::Timeout, format!("page load timeout after {:?}", config.timeout)))?
        .map_err(|e| (FailureKind::classify(&e.to_string()), e.to_string()))?;

    let pre_accept_names: std::collections::HashSet<String> = extract_cookies(page)
        .await
        .map(|cookies| cookies.into_iter().map(|c| c.name).collect())
        .unwrap_or_default();

    try_accept_consent(page, &config.accept_selector).await;

    tokio::time::sleep(config.settle_wait).await;

    let cookies = extract_cookies(page)
        .await
        .map(|cookies| {
            cookies
                .into_iter()
                .map(|mut c| {
                    c.set_after_accept = !pre_accept_names.contains(&c.name);
                    c
                })
                .collect::<Vec<_>>()
        })
        .map_err(|e| (FailureKind::Extraction, e.to_string()))?;
    let storage = extract_storage(page)
        .await
        .map_err(|e| (FailureKind::Extraction, e.to_string()))?;

    Ok(PageResult {
        url: url.to_string(),
        success: true,
        cookies,
        storage,
        duration_seconds: start.elapsed().as_secs_f64(),
        retries: 0,
        error: None,
    })
}

/// Best-effort: a missing or unclickable consent banner is not a failure,
/// since most pages under scan either have no banner or one requiring no
/// interaction to reveal same-party cookies.
async fn try_accept_consent(page: &Page, selector: &str) {
    match tokio::time::timeout(Duration::from_millis(1500), page.find_element(selector)).await {
        Ok(Ok(element)) => {
            if let Err(e) = element.click().await {
                debug!("consent selector '{}' found but click failed: {}", selector, e);
            }
        }
        Ok(Err(_)) => debug!("no consent element matched '{}'", selector),
        Err(_) => debug!("consent selector '{}' lookup timed out", selector),
    }
}

async fn extract_cookies(page: &Page) -> anyhow::Result<Vec<CookieObservation>> {
    let raw = page.get_cookies().await?;
    Ok(raw
        .into_iter()
        .map(|c| CookieObservation {
            name: c.name,
            value: c.value,
            domain: c.domain,
            path: c.path,
            expires: if c.expires <= 0.0 { CookieExpiry::Session } else { CookieExpiry::At(c.expires as i64) },
            http_only: c.http_only,
            secure: c.secure,
            same_site: map_same_site(c.same_site),
            size: c.size.max(0) as usize,
            set_after_accept: false,
        })
        .collect())
}

fn map_same_site(raw: Option<chromiumoxide::cdp::browser_protocol::network::CookieSameSite>) -> SameSite {
    use chromiumoxide::cdp::browser_protocol::network::CookieSameSite;
    match raw {
        Some(CookieSameSite::Strict) => SameSite::Strict,
        Some(CookieSameSite::Lax) => SameSite::Lax,
        Some(CookieSameSite::None) => SameSite::None,
        None => SameSite::Unspecified,
    }
}

async fn extract_storage(page: &Page) -> anyhow::Result<StorageSnapshot> {
    let js_result = page.evaluate(STORAGE_SCRIPT).await?;
    let raw: RawStorage = js_result.into_value()?;
    Ok(StorageSnapshot { local_storage: raw.local, session_storage: raw.session })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_bounds() {
        let config = VisitConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(crate::utils::constants::DEFAULT_PAGE_TIMEOUT_MS));
        assert_eq!(config.max_retries, crate::utils::constants::DEFAULT_MAX_RETRIES);
    }
}

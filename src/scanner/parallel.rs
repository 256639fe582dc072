//! Parallel Page Scanner: single browser, single semaphore, batched
//! concurrency. This is `quickScan`/`deepScan` — the non-enterprise path for
//! domains small enough that one browser process is plenty.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use url::Url;

use crate::config::ScanConfig;
use crate::events::{ScanEvent, ScanEventBus};
use crate::model::{ScanMetrics, ScanMode, ScanResult};
use crate::page_visitor::{self, VisitConfig};
use crate::scanner::aggregate::{ordered_fold, Aggregator};
use crate::scanner::cancellation::CancellationToken;
use crate::scanner::scan_id::generate_scan_id;

const LINKS_SCRIPT: &str = r#"
Array.from(document.querySelectorAll('a[href]')).map(a => a.href)
"#;

pub async fn quick_scan(config: &ScanConfig, bus: &ScanEventBus, cancel: &CancellationToken) -> Result<ScanResult> {
    run(config, bus, false, cancel).await
}

pub async fn deep_scan(config: &ScanConfig, bus: &ScanEventBus, cancel: &CancellationToken) -> Result<ScanResult> {
    run(config, bus, true, cancel).await
}

async fn run(config: &ScanConfig, bus: &ScanEventBus, discover_links: bool, cancel: &CancellationToken) -> Result<ScanResult> {
    let start = Instant::now();
    let scan_id = generate_scan_id(&config.domain);
    let mode = if discover_links { ScanMode::Deep } else { ScanMode::Quick };

    let profile = crate::browser_profile::create_unique_profile_with_prefix("scanner_chrome_parallel")
        .context("failed to create browser profile for parallel scanner")?;
    let user_data_dir = profile.into_path();
    let (browser, _handler, _dir) = crate::browser_setup::launch_browser(true, Some(user_data_dir)).await?;
    let browser = Arc::new(browser);

    let mut urls = starting_urls(&config.domain, &config.custom_pages, discover_links)?;
    if discover_links && urls.len() < config.max_pages {
        match discover_more_links(&browser, &config.domain, config.max_pages - urls.len()).await {
            Ok(discovered) => {
                for url in discovered {
                    if urls.len() >= config.max_pages {
                        break;
                    }
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
            }
            Err(e) => warn!("link discovery failed, continuing with starting set only: {}", e),
        }
    }
    urls.truncate(config.max_pages);

    let total_pages = urls.len();
    bus.publish(ScanEvent::scan_started(scan_id.clone(), config.domain.clone(), total_pages))
        .ok();

    let batch_size = config.concurrency;
    let total_batches = total_pages.div_ceil(batch_size.max(1));
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let visit_config = VisitConfig {
        timeout: std::time::Duration::from_millis(config.timeout_ms),
        max_retries: config.max_retries,
        accept_selector: config.accept_selector.clone(),
        settle_wait: std::time::Duration::from_millis(1500),
    };

    let mut aggregator = Aggregator::new();
    let mut batch_durations = Vec::new();
    let mut cancelled = false;

    'batches: for (batch_idx, batch) in urls.chunks(batch_size.max(1)).enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break 'batches;
        }

        let batch_start = Instant::now();
        let mut handles = Vec::with_capacity(batch.len());

        for (offset, url) in batch.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let url_index = batch_idx * batch_size.max(1) + offset;
            let permit = Arc::clone(&semaphore);
            let browser = Arc::clone(&browser);
            let url = url.clone();
            let visit_config = visit_config.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore never closed");
                let result = page_visitor::visit(&browser, &url, &visit_config).await;
                (url_index, url, result)
            }));
        }

        let mut batch_results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(triple) => batch_results.push(triple),
                Err(e) => warn!("page visit task panicked: {}", e),
            }
        }
        ordered_fold(&mut aggregator, batch_results);
        batch_durations.push(batch_start.elapsed().as_secs_f64());

        let avg_batch_time = batch_durations.iter().sum::<f64>() / batch_durations.len() as f64;
        let batches_remaining = total_batches.saturating_sub(batch_idx + 1);
        let scanned_pages = ((batch_idx + 1) * batch_size.max(1)).min(total_pages);
        let cookies_so_far = aggregator.len_hint();

        bus.publish(ScanEvent::batch_completed(
            scan_id.clone(),
            crate::model::ScanProgress {
                total_pages,
                scanned_pages,
                current_batch: batch_idx + 1,
                total_batches,
                cookies_found: cookies_so_far,
                elapsed_seconds: start.elapsed().as_secs_f64(),
                estimated_remaining_seconds: avg_batch_time * batches_remaining as f64,
            },
        ))
        .ok();

        if cancelled {
            break 'batches;
        }
    }

    if cancelled {
        info!("scan {} cancelled before scheduling all pages", scan_id);
    }

    let (cookies, storages, pages_visited, pages_failed) = aggregator.into_parts();
    let duration_seconds = start.elapsed().as_secs_f64();
    let pages_per_second = if duration_seconds > 0.0 { total_pages as f64 / duration_seconds } else { 0.0 };

    let classifier = crate::classifier::CookieClassifier::new();
    let scan_target_host = config.domain_host();
    let classified: Vec<_> = cookies
        .iter()
        .map(|c| classifier.classify(c, &config.domain, &scan_target_host))
        .collect();

    let total_pages_scanned = pages_visited.len();
    let failed_pages_count = pages_failed.len();
    let unique_cookies = classified.len();

    let result = ScanResult {
        scan_id: scan_id.clone(),
        domain: config.domain.clone(),
        scan_mode: mode,
        total_pages_scanned,
        failed_pages_count,
        unique_cookies,
        cookies: classified,
        storages,
        pages_visited,
        pages_failed,
        duration_seconds,
        pages_per_second,
        metrics: ScanMetrics {
            total_pages,
            scanned: total_pages_scanned + failed_pages_count,
            successful: total_pages_scanned,
            failed: failed_pages_count,
            cookies_found: unique_cookies,
            elapsed_seconds: duration_seconds,
            pages_per_second,
            estimated_remaining_seconds: 0.0,
            active_browsers: 1,
            current_concurrency: config.concurrency,
            errors_count: failed_pages_count,
        },
        cancelled,
    };

    bus.publish(ScanEvent::scan_completed(
        scan_id,
        result.total_pages_scanned,
        result.unique_cookies,
        std::time::Duration::from_secs_f64(duration_seconds),
    ))
    .ok();

    info!("scan complete: domain={} pages={} cookies={} duration={:.1}s cancelled={}", config.domain, result.total_pages_scanned, result.unique_cookies, duration_seconds, result.cancelled);
    Ok(result)
}

/// Builds the starting URL set: `{domain} ∪ customPages`, relative entries
/// resolved against `domain`. Quick scans keep every custom page regardless
/// of origin (the caller asked for it explicitly); deep scans filter to the
/// same registrable domain, matching the same same-origin rule deep-scan
/// link discovery applies to URLs it finds on its own.
fn starting_urls(domain: &str, custom_pages: &[String], same_origin_only: bool) -> Result<Vec<String>> {
    let base = Url::parse(domain).context("domain must be an absolute URL")?;
    let registrable = crate::utils::registrable_domain(base.host_str().unwrap_or_default());
    let mut urls = vec![base.to_string()];
    for page in custom_pages {
        match base.join(page) {
            Ok(resolved) => {
                let host = resolved.host_str().unwrap_or_default();
                if same_origin_only && crate::utils::registrable_domain(host) != registrable {
                    warn!("dropping off-origin custom page '{}' from deep scan", resolved);
                    continue;
                }
                urls.push(resolved.to_string());
            }
            Err(e) => warn!("skipping unresolvable custom page '{}': {}", page, e),
        }
    }
    let mut seen = HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
    Ok(urls)
}

#[cfg(test)]
mod starting_urls_tests {
    use super::*;

    #[test]
    fn quick_scan_keeps_off_origin_custom_pages() {
        let urls = starting_urls("https://example.com", &["https://other.com/x".to_string()], false).unwrap();
        assert!(urls.iter().any(|u| u.contains("other.com")));
    }

    #[test]
    fn deep_scan_drops_off_origin_custom_pages() {
        let urls = starting_urls(
            "https://example.com",
            &["https://other.com/x".to_string(), "/same-origin".to_string()],
            true,
        )
        .unwrap();
        assert!(!urls.iter().any(|u| u.contains("other.com")));
        assert!(urls.iter().any(|u| u.contains("same-origin")));
    }
}

async fn discover_more_links(browser: &chromiumoxide::Browser, domain: &str, want: usize) -> Result<Vec<String>> {
    let base = Url::parse(domain)?;
    let registrable = crate::utils::registrable_domain(base.host_str().unwrap_or_default());

    let page = browser.new_page(domain).await?;
    page.wait_for_navigation().await.ok();
    let js_result = page.evaluate(LINKS_SCRIPT).await?;
    let hrefs: Vec<String> = js_result.into_value().unwrap_or_default();
    page.close().await.ok();

    let mut discovered = Vec::new();
    let mut seen = HashSet::new();
    for href in hrefs {
        if discovered.len() >= want {
            break;
        }
        if let Ok(url) = Url::parse(&href) {
            let host = url.host_str().unwrap_or_default();
            if crate::utils::registrable_domain(host) == registrable && seen.insert(url.to_string()) {
                discovered.push(url.to_string());
            }
        }
    }
    Ok(discovered)
}

//! Enterprise Scanner: browser-pool-backed, chunked, checkpointed, resumable
//! deep scan for domains up to 20,000 pages.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use url::Url;

use crate::browser_pool::{BrowserPool, BrowserPoolConfig};
use crate::checkpoint::CheckpointStore;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::events::{ScanEvent, ScanEventBus};
use crate::model::{AggregatedCookie, Checkpoint, PageResult, ScanMetrics, ScanMode, ScanResult};
use crate::page_visitor::{self, VisitConfig};
use crate::scanner::aggregate::{ordered_fold, Aggregator};
use crate::scanner::cancellation::CancellationToken;
use crate::scanner::scan_id::generate_scan_id;

pub async fn enterprise_deep_scan(
    config: &ScanConfig,
    bus: &ScanEventBus,
    checkpoint_store: &CheckpointStore,
    cancel: &CancellationToken,
) -> Result<ScanResult> {
    let start = Instant::now();

    let (scan_id, mut pending, mut completed, mut aggregator) = resolve_starting_state(config, checkpoint_store).await?;
    let total_urls = completed.len() + pending.len();

    bus.publish(ScanEvent::scan_started(scan_id.clone(), config.domain.clone(), total_urls)).ok();

    let pool = BrowserPool::start(BrowserPoolConfig {
        pool_size: config.browser_pool_size,
        pages_per_browser: config.pages_per_browser,
        headless: true,
    })
    .await
    .context("enterprise scanner failed to start browser pool")?;

    let visit_config = VisitConfig {
        timeout: std::time::Duration::from_millis(config.timeout_ms),
        max_retries: config.max_retries,
        accept_selector: config.accept_selector.clone(),
        settle_wait: std::time::Duration::from_millis(1500),
    };

    let p = config.browser_pool_size;
    let k = config.pages_per_browser;
    let effective_concurrency = Arc::new(AtomicUsize::new(p * k));
    let mut prior_pages_per_second: Option<f64> = None;
    let mut failed_count = 0usize;
    let mut next_checkpoint_at = completed.len() + config.checkpoint_interval;
    let checkpoint_in_flight = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let mut cancelled = false;

    'chunks: for (chunk_idx, chunk) in pending.clone().chunks(config.chunk_size).enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break 'chunks;
        }

        let chunk_start = Instant::now();
        let outer_cap = effective_concurrency.load(Ordering::Relaxed).clamp(p, p * k);
        let outer_semaphore = Arc::new(Semaphore::new(outer_cap));

        let mut handles = Vec::with_capacity(chunk.len());
        for (offset, url) in chunk.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let url_index = completed.len() + chunk_idx * config.chunk_size + offset;
            let pool = Arc::clone(&pool);
            let outer = Arc::clone(&outer_semaphore);
            let visit_config = visit_config.clone();
            let url = url.clone();

            handles.push(tokio::spawn(async move {
                let _outer_permit = outer.acquire_owned().await.expect("semaphore never closed");
                match pool.acquire(url_index).await {
                    Ok(guard) => {
                        let result = page_visitor::visit(guard.browser(), &url, &visit_config).await;
                        if matches!(&result.error, Some(e) if crate::error::FailureKind::classify(e) == crate::error::FailureKind::Fatal) {
                            pool.mark_unhealthy(guard.slot_id());
                        }
                        (url_index, url, result)
                    }
                    Err(ScanError::PoolExhausted { healthy, total }) => {
                        warn!("pool exhausted ({}/{} healthy), failing page {}", healthy, total, url);
                        (url_index, url.clone(), PageResult::failed(url, format!("pool exhausted: {healthy}/{total} healthy"), 0, 0.0))
                    }
                    Err(e) => (url_index, url.clone(), PageResult::failed(url, e.to_string(), 0, 0.0)),
                }
            }));
        }

        let mut chunk_results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(triple) => chunk_results.push(triple),
                Err(e) => warn!("enterprise page task panicked: {}", e),
            }
        }

        for (_, url, result) in &chunk_results {
            if result.success {
                completed.push(url.clone());
            } else {
                completed.push(url.clone());
                failed_count += 1;
            }
        }
        let chunk_url_set: HashSet<&String> = chunk.iter().collect();
        pending.retain(|u| !chunk_url_set.contains(u));

        ordered_fold(&mut aggregator, chunk_results);

        let chunk_elapsed = chunk_start.elapsed().as_secs_f64();
        let pages_per_second = if chunk_elapsed > 0.0 { chunk.len() as f64 / chunk_elapsed } else { 0.0 };

        if config.adaptive_concurrency {
            adjust_effective_concurrency(&effective_concurrency, prior_pages_per_second, pages_per_second, p, k);
        }
        prior_pages_per_second = Some(pages_per_second);

        let elapsed_seconds = start.elapsed().as_secs_f64();
        let remaining = pending.len();
        let metrics = ScanMetrics {
            total_pages: total_urls,
            scanned: completed.len(),
            successful: completed.len() - failed_count,
            failed: failed_count,
            cookies_found: aggregator.len_hint(),
            elapsed_seconds,
            pages_per_second,
            estimated_remaining_seconds: if pages_per_second > 0.0 { remaining as f64 / pages_per_second } else { 0.0 },
            active_browsers: pool.healthy_count(),
            current_concurrency: effective_concurrency.load(Ordering::Relaxed),
            errors_count: failed_count,
        };
        bus.publish(ScanEvent::chunk_completed(scan_id.clone(), metrics.clone())).ok();

        if config.enable_persistence && completed.len() >= next_checkpoint_at {
            next_checkpoint_at += config.checkpoint_interval;
            spawn_checkpoint_write(
                checkpoint_store.clone(),
                Arc::clone(&checkpoint_in_flight),
                scan_id.clone(),
                config.domain.clone(),
                total_urls,
                completed.clone(),
                pending.clone(),
                aggregator.snapshot(),
                metrics,
            );
        }

        if pool.healthy_count() * 2 < p {
            pool.stop().await;
            anyhow::bail!("browser pool fell below minimum health ({}/{} alive); aborting scan", pool.healthy_count(), p);
        }

        if cancelled {
            break 'chunks;
        }
    }

    if cancelled {
        info!("enterprise scan {} cancelled before scheduling all chunks", scan_id);
    }

    pool.stop().await;

    let (cookies, storages, pages_visited, pages_failed) = aggregator.into_parts();
    let duration_seconds = start.elapsed().as_secs_f64();
    let pages_per_second = if duration_seconds > 0.0 { total_urls as f64 / duration_seconds } else { 0.0 };

    let classifier = crate::classifier::CookieClassifier::new();
    let scan_target_host = config.domain_host();
    let classified: Vec<_> = cookies.iter().map(|c| classifier.classify(c, &config.domain, &scan_target_host)).collect();

    let total_pages_scanned = pages_visited.len();
    let failed_pages_count = pages_failed.len();
    let unique_cookies = classified.len();

    let result = ScanResult {
        scan_id: scan_id.clone(),
        domain: config.domain.clone(),
        scan_mode: ScanMode::Enterprise,
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
            total_pages: total_urls,
            scanned: total_pages_scanned + failed_pages_count,
            successful: total_pages_scanned,
            failed: failed_pages_count,
            cookies_found: unique_cookies,
            elapsed_seconds: duration_seconds,
            pages_per_second,
            estimated_remaining_seconds: 0.0,
            active_browsers: 0,
            current_concurrency: effective_concurrency.load(Ordering::Relaxed),
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

    info!(
        "enterprise scan complete: domain={} pages={} cookies={} duration={:.1}s cancelled={}",
        config.domain, result.total_pages_scanned, result.unique_cookies, duration_seconds, result.cancelled
    );
    Ok(result)
}

/// Resolves the (scan_id, pending_urls, completed_urls, seeded aggregator)
/// starting state, either fresh or resumed from a checkpoint.
async fn resolve_starting_state(
    config: &ScanConfig,
    checkpoint_store: &CheckpointStore,
) -> Result<(String, Vec<String>, Vec<String>, Aggregator)> {
    if let Some(resume_id) = &config.resume_scan_id {
        if let Ok(checkpoint) = checkpoint_store.load(resume_id).await {
            info!("resuming scan {} from checkpoint: {} completed, {} pending", resume_id, checkpoint.completed_urls.len(), checkpoint.pending_urls.len());
            let mut aggregator = Aggregator::new();
            aggregator.seed(checkpoint.cookies);
            return Ok((resume_id.clone(), checkpoint.pending_urls, checkpoint.completed_urls, aggregator));
        }
        warn!("resume_scan_id {} given but no checkpoint found; starting fresh", resume_id);
    }

    let scan_id = generate_scan_id(&config.domain);
    let base = Url::parse(&config.domain).context("domain must be an absolute URL")?;
    let registrable = crate::utils::registrable_domain(base.host_str().unwrap_or_default());
    let mut urls = vec![base.to_string()];
    for page in &config.custom_pages {
        if let Ok(resolved) = base.join(page) {
            let host = resolved.host_str().unwrap_or_default();
            if crate::utils::registrable_domain(host) != registrable {
                warn!("dropping off-origin custom page '{}' from enterprise scan", resolved);
                continue;
            }
            urls.push(resolved.to_string());
        }
    }
    let mut seen = HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
    urls.truncate(config.max_pages);

    Ok((scan_id, urls, Vec::new(), Aggregator::new()))
}

/// Detaches the checkpoint write onto its own task so chunk N+1 never waits
/// on chunk N's checkpoint landing on disk. `in_flight` guards against
/// overlapping writes to the same scan's checkpoint file; if a write is
/// still running when the next checkpoint interval is hit, that interval is
/// skipped rather than queued, since the next one to actually run will
/// already carry a superset of the skipped one's progress.
fn spawn_checkpoint_write(
    store: CheckpointStore,
    in_flight: Arc<std::sync::atomic::AtomicBool>,
    scan_id: String,
    domain: String,
    total_urls: usize,
    completed: Vec<String>,
    pending: Vec<String>,
    cookies: Vec<AggregatedCookie>,
    metrics: ScanMetrics,
) {
    if in_flight.swap(true, Ordering::AcqRel) {
        warn!("skipping checkpoint for scan {}: previous write still in flight", scan_id);
        return;
    }
    tokio::spawn(async move {
        let checkpoint = Checkpoint {
            scan_id: scan_id.clone(),
            domain,
            total_urls,
            completed_urls: completed,
            pending_urls: pending,
            cookies,
            metrics,
            timestamp: Utc::now(),
        };
        if let Err(e) = store.save(&checkpoint).await {
            warn!("failed to persist checkpoint for scan {}: {}", scan_id, e);
        }
        in_flight.store(false, Ordering::Release);
    });
}

/// After each chunk, compare pagesPerSecond against the prior chunk: a >20%
/// decline with room to shrink reduces K-effective by 10%; an improvement
/// with room to grow increases it by 10%. Bounds: [P, P*K].
fn adjust_effective_concurrency(current: &Arc<AtomicUsize>, prior: Option<f64>, observed: f64, p: usize, k: usize) {
    let Some(prior) = prior else { return };
    if prior <= 0.0 {
        return;
    }
    let change = (observed - prior) / prior;
    let value = current.load(Ordering::Relaxed);
    let min = p;
    let max = p * k;

    if change < -0.20 && value > min {
        let reduced = ((value as f64) * 0.9).round() as usize;
        current.store(reduced.max(min), Ordering::Relaxed);
    } else if change > 0.0 && value < max {
        let increased = ((value as f64) * 1.1).round() as usize;
        current.store(increased.min(max), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_shrinks_on_sharp_decline() {
        let current = Arc::new(AtomicUsize::new(100));
        adjust_effective_concurrency(&current, Some(10.0), 7.0, 5, 20);
        assert!(current.load(Ordering::Relaxed) < 100);
        assert!(current.load(Ordering::Relaxed) >= 5);
    }

    #[test]
    fn adjust_grows_on_improvement() {
        let current = Arc::new(AtomicUsize::new(50));
        adjust_effective_concurrency(&current, Some(10.0), 12.0, 5, 20);
        assert!(current.load(Ordering::Relaxed) > 50);
        assert!(current.load(Ordering::Relaxed) <= 100);
    }

    #[test]
    fn adjust_respects_floor() {
        let current = Arc::new(AtomicUsize::new(5));
        adjust_effective_concurrency(&current, Some(10.0), 1.0, 5, 20);
        assert_eq!(current.load(Ordering::Relaxed), 5);
    }
}

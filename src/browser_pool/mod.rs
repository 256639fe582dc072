//! Fixed-width browser pool: P browser instances, each allowing K concurrent
//! pages, assigned to incoming URLs by round robin. This is the Enterprise
//! Scanner's concurrency backbone — total effective concurrency is P × K.
//!
//! Unlike a demand-scaled pool, P and K are fixed for the lifetime of a scan:
//! chunk-based checkpointing needs a stable concurrency budget to reason
//! about, not one that grows and shrinks under it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ScanError;

#[derive(Debug, Clone)]
pub struct BrowserPoolConfig {
    /// P: number of browser instances, bounded 1..=10.
    pub pool_size: usize,
    /// K: pages-per-browser, bounded 1..=50.
    pub pages_per_browser: usize,
    pub headless: bool,
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: crate::utils::constants::DEFAULT_BROWSER_POOL_SIZE,
            pages_per_browser: crate::utils::constants::DEFAULT_PAGES_PER_BROWSER,
            headless: true,
        }
    }
}

/// RAII wrapper around a launched browser; aborts the CDP event handler task
/// and removes its temp profile directory on drop.
#[derive(Debug)]
struct PooledBrowserWrapper {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl PooledBrowserWrapper {
    fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self { browser: Arc::new(browser), handler, user_data_dir: Some(user_data_dir) }
    }

    fn browser_arc(&self) -> Arc<Browser> {
        Arc::clone(&self.browser)
    }

    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!("failed to clean up browser temp directory {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for PooledBrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        self.cleanup_temp_dir();
    }
}

struct Slot {
    id: usize,
    wrapper: PooledBrowserWrapper,
    healthy: AtomicBool,
    semaphore: Arc<Semaphore>,
}

/// Fixed P×K browser pool.
pub struct BrowserPool {
    config: BrowserPoolConfig,
    slots: Vec<Slot>,
}

impl BrowserPool {
    /// Launches all P browsers up front; `start()` does not return until
    /// every slot is either live or has failed to launch.
    pub async fn start(config: BrowserPoolConfig) -> Result<Arc<Self>> {
        info!("starting browser pool: pool_size={} pages_per_browser={}", config.pool_size, config.pages_per_browser);

        let mut slots = Vec::with_capacity(config.pool_size);
        for id in 0..config.pool_size {
            match launch_slot(id, &config).await {
                Ok(slot) => slots.push(slot),
                Err(e) => warn!("slot {id} failed to launch: {e}"),
            }
        }

        if slots.is_empty() {
            anyhow::bail!("browser pool failed to launch any slots");
        }

        info!("browser pool started with {}/{} healthy slots", slots.len(), config.pool_size);
        Ok(Arc::new(Self { config, slots }))
    }

    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    pub fn healthy_count(&self) -> usize {
        self.slots.iter().filter(|s| s.healthy.load(Ordering::Relaxed)).count()
    }

    /// Round-robin slot assignment: `browser_index = url_index mod P`,
    /// skipping unhealthy slots. Blocks until the chosen slot has a free page
    /// permit (this is the K-per-browser cap), not just until one is picked.
    pub async fn acquire(self: &Arc<Self>, url_index: usize) -> Result<PooledPageGuard, ScanError> {
        if self.healthy_count() * 2 < self.config.pool_size {
            return Err(ScanError::PoolExhausted { healthy: self.healthy_count(), total: self.config.pool_size });
        }

        let n = self.slots.len();
        let primary = url_index % n;
        for offset in 0..n {
            let idx = (primary + offset) % n;
            let slot = &self.slots[idx];
            if !slot.healthy.load(Ordering::Relaxed) {
                continue;
            }
            let permit = Arc::clone(&slot.semaphore).acquire_owned().await.expect("semaphore never closed");
            debug!("acquired slot {} for url_index {}", slot.id, url_index);
            return Ok(PooledPageGuard { browser: slot.wrapper.browser_arc(), slot_id: slot.id, _permit: permit });
        }

        Err(ScanError::PoolExhausted { healthy: self.healthy_count(), total: self.config.pool_size })
    }

    /// Mark a slot unhealthy after a browser-fatal error (context closed,
    /// process crashed). Subsequent round-robin hits skip it.
    pub fn mark_unhealthy(&self, slot_id: usize) {
        if let Some(slot) = self.slots.iter().find(|s| s.id == slot_id) {
            if !slot.healthy.swap(false, Ordering::Relaxed) {
                return;
            }
            warn!("marked browser slot {} unhealthy", slot_id);
        }
    }

    pub async fn stop(&self) {
        info!("stopping browser pool");
        for slot in &self.slots {
            if let Err(e) = slot.wrapper.browser.clone().close().await {
                warn!("failed to close browser slot {}: {}", slot.id, e);
            }
        }
    }
}

async fn launch_slot(id: usize, config: &BrowserPoolConfig) -> Result<Slot> {
    let profile = crate::browser_profile::create_unique_profile_with_prefix("scanner_chrome_pool")
        .context("failed to create unique pool browser profile")?;
    let user_data_dir = profile.into_path();

    let (browser, handler, _dir) = crate::browser_setup::launch_browser(config.headless, Some(user_data_dir.clone()))
        .await
        .context("failed to launch browser for pool slot")?;

    Ok(Slot {
        id,
        wrapper: PooledBrowserWrapper::new(browser, handler, user_data_dir),
        healthy: AtomicBool::new(true),
        semaphore: Arc::new(Semaphore::new(config.pages_per_browser)),
    })
}

/// RAII guard for one page permit within a slot. Releases the K-capacity
/// permit on drop; does not itself close a `Page` (the caller is responsible
/// for closing any `chromiumoxide::Page` it opens against `browser()`).
pub struct PooledPageGuard {
    browser: Arc<Browser>,
    slot_id: usize,
    _permit: OwnedSemaphorePermit,
}

impl PooledPageGuard {
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn slot_id(&self) -> usize {
        self.slot_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = BrowserPoolConfig::default();
        assert_eq!(cfg.pool_size, crate::utils::constants::DEFAULT_BROWSER_POOL_SIZE);
        assert_eq!(cfg.pages_per_browser, crate::utils::constants::DEFAULT_PAGES_PER_BROWSER);
    }
}

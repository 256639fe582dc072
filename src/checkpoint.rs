//! Checkpoint persistence: atomic write-temp-then-rename, same pattern this
//! codebase already uses for saved page content, applied here to resumable
//! scan state instead of page bytes.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::model::Checkpoint;

#[derive(Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, scan_id: &str) -> PathBuf {
        self.dir.join(format!("{scan_id}.checkpoint.json"))
    }

    /// Writes `checkpoint` atomically: serialize to a temp file in the same
    /// directory, then rename over the final path. A crash mid-write leaves
    /// either the old checkpoint or nothing — never a truncated one.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        if !checkpoint.is_consistent() {
            anyhow::bail!("refusing to persist an inconsistent checkpoint for scan {}", checkpoint.scan_id);
        }

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create checkpoint directory {}", self.dir.display()))?;

        let path = self.path_for(&checkpoint.scan_id);
        let bytes = serde_json::to_vec_pretty(checkpoint).context("failed to serialize checkpoint")?;

        let dir = self.dir.clone();
        let path_clone = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut temp_file = NamedTempFile::new_in(&dir).context("failed to create temp checkpoint file")?;
            temp_file.write_all(&bytes).context("failed to write checkpoint bytes")?;
            temp_file.persist(&path_clone).context("failed to persist checkpoint file")?;
            Ok(())
        })
        .await
        .context("checkpoint write task panicked")??;

        debug!("checkpoint saved: scan_id={} completed={} pending={}", checkpoint.scan_id, checkpoint.completed_urls.len(), checkpoint.pending_urls.len());
        Ok(())
    }

    pub async fn load(&self, scan_id: &str) -> Result<Checkpoint> {
        let path = self.path_for(scan_id);
        load_from_path(&path).await
    }

    pub fn exists(&self, scan_id: &str) -> bool {
        self.path_for(scan_id).exists()
    }

    pub async fn remove(&self, scan_id: &str) -> Result<()> {
        let path = self.path_for(scan_id);
        if path.exists() {
            tokio::fs::remove_file(&path).await.with_context(|| format!("failed to remove checkpoint {}", path.display()))?;
            info!("removed checkpoint for completed scan {}", scan_id);
        }
        Ok(())
    }
}

async fn load_from_path(path: &Path) -> Result<Checkpoint> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read checkpoint file {}", path.display()))?;
    let checkpoint: Checkpoint = serde_json::from_slice(&bytes).context("failed to parse checkpoint file")?;
    if !checkpoint.is_consistent() {
        anyhow::bail!("checkpoint file {} failed consistency check on load", path.display());
    }
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScanMetrics;
    use chrono::Utc;

    fn sample(scan_id: &str) -> Checkpoint {
        Checkpoint {
            scan_id: scan_id.to_string(),
            domain: "example.com".to_string(),
            total_urls: 3,
            completed_urls: vec!["https://example.com/a".into()],
            pending_urls: vec!["https://example.com/b".into(), "https://example.com/c".into()],
            cookies: vec![],
            metrics: ScanMetrics::default(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let checkpoint = sample("scan_roundtrip");

        store.save(&checkpoint).await.unwrap();
        assert!(store.exists("scan_roundtrip"));

        let loaded = store.load("scan_roundtrip").await.unwrap();
        assert_eq!(loaded.scan_id, checkpoint.scan_id);
        assert_eq!(loaded.completed_urls, checkpoint.completed_urls);
        assert_eq!(loaded.pending_urls, checkpoint.pending_urls);
    }

    #[tokio::test]
    async fn refuses_to_save_inconsistent_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample("scan_bad");
        checkpoint.pending_urls.push("https://example.com/a".into());

        let result = store.save(&checkpoint).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let checkpoint = sample("scan_remove");
        store.save(&checkpoint).await.unwrap();
        store.remove("scan_remove").await.unwrap();
        assert!(!store.exists("scan_remove"));
    }
}

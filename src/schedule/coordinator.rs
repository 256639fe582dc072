//! Schedule Coordinator: on each tick, runs every enabled, due schedule
//! under a non-blocking distributed lock, dispatching to the quick or deep
//! scan path by `ScanType` — the same dispatch shape the original scheduled
//! scan executor used, now against this crate's own scanners.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::checkpoint::CheckpointStore;
use crate::config::{MissingDomain, ScanRequestBuilder};
use crate::events::ScanEventBus;
use crate::model::{Schedule, ScheduleExecution, ScheduleStatus, ScanMode, ScanType};
use crate::schedule::lock::{lock_key_for_schedule, DistributedLock};
use crate::schedule::next_run::next_run;

pub struct ScheduleCoordinator<L: DistributedLock> {
    lock: L,
    lock_ttl: Duration,
    checkpoint_store: CheckpointStore,
    bus: ScanEventBus,
}

impl<L: DistributedLock> ScheduleCoordinator<L> {
    pub fn new(lock: L, lock_ttl: Duration, checkpoint_store: CheckpointStore, bus: ScanEventBus) -> Self {
        Self { lock, lock_ttl, checkpoint_store, bus }
    }

    /// Runs one coordinator tick over `schedules`, returning the executions
    /// produced (one per schedule that was due, whether it ran, skipped, or
    /// failed). Schedules not yet due are left untouched.
    pub async fn tick(&self, schedules: &mut [Schedule], now: chrono::DateTime<Utc>) -> Vec<ScheduleExecution> {
        let mut executions = Vec::new();
        for schedule in schedules.iter_mut() {
            if !schedule.enabled {
                continue;
            }
            let Some(due) = schedule.next_run else { continue };
            if due > now {
                continue;
            }

            let execution = self.run_one(schedule, now).await;
            schedule.last_run = Some(now);
            schedule.last_status = Some(execution.status);
            schedule.next_run = next_run(schedule.frequency, &schedule.time_config, now);
            executions.push(execution);
        }
        executions
    }

    async fn run_one(&self, schedule: &Schedule, now: chrono::DateTime<Utc>) -> ScheduleExecution {
        let execution_id = Uuid::new_v4().to_string();
        let key = lock_key_for_schedule(&schedule.schedule_id);
        let token = format!("{}:{}", execution_id, Uuid::new_v4());

        if !self.lock.set_if_absent(&key, &token, self.lock_ttl).await {
            info!("schedule {} skipped: lock held by another instance", schedule.schedule_id);
            return ScheduleExecution {
                execution_id,
                schedule_id: schedule.schedule_id.clone(),
                started_at: now,
                completed_at: Some(now),
                status: ScheduleStatus::Skipped,
                scan_id: None,
                error: None,
            };
        }

        info!("schedule {} starting {:?} scan of {}", schedule.schedule_id, schedule.scan_type, schedule.domain);
        let outcome = self.execute(schedule).await;

        if !self.lock.compare_and_delete(&key, &token).await {
            warn!("schedule {} lock release mismatch (token no longer held by us)", schedule.schedule_id);
        }

        match outcome {
            Ok(scan_id) => ScheduleExecution {
                execution_id,
                schedule_id: schedule.schedule_id.clone(),
                started_at: now,
                completed_at: Some(Utc::now()),
                status: ScheduleStatus::Succeeded,
                scan_id: Some(scan_id),
                error: None,
            },
            Err(e) => {
                warn!("schedule {} scan failed: {}", schedule.schedule_id, e);
                ScheduleExecution {
                    execution_id,
                    schedule_id: schedule.schedule_id.clone(),
                    started_at: now,
                    completed_at: Some(Utc::now()),
                    status: ScheduleStatus::Failed,
                    scan_id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn execute(&self, schedule: &Schedule) -> anyhow::Result<String> {
        let mode = match schedule.scan_type {
            ScanType::Quick => ScanMode::Quick,
            ScanType::Deep => ScanMode::Deep,
        };

        let mut builder = ScanRequestBuilder::<MissingDomain>::new().domain(schedule.domain.clone()).mode(mode);
        if let Some(max_pages) = schedule.scan_params.max_pages {
            builder = builder.max_pages(max_pages);
        }
        if !schedule.scan_params.custom_pages.is_empty() {
            builder = builder.custom_pages(schedule.scan_params.custom_pages.clone());
        }
        if let Some(chunk_size) = schedule.scan_params.chunk_size {
            builder = builder.chunk_size(chunk_size);
        }
        if let Some(selector) = &schedule.scan_params.accept_selector {
            builder = builder.accept_selector(selector.clone());
        }
        if let Some(ua) = &schedule.scan_params.user_agent {
            builder = builder.user_agent(ua.clone());
        }

        let config = builder.build()?;
        let cancel = crate::scanner::CancellationToken::new();
        let result = crate::scanner::run_scan(&config, &self.bus, &self.checkpoint_store, &cancel).await?;
        Ok(result.scan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScanParams, ScheduleFrequency, TimeConfig};
    use crate::schedule::lock::InProcessLock;

    fn sample_schedule(next_run_at: Option<chrono::DateTime<Utc>>) -> Schedule {
        Schedule {
            schedule_id: "sched-1".into(),
            domain_config_id: "cfg-1".into(),
            domain: "https://example.com".into(),
            scan_type: ScanType::Quick,
            scan_params: ScanParams { max_pages: Some(5), ..Default::default() },
            frequency: ScheduleFrequency::Daily,
            time_config: TimeConfig { hour: Some(9), minute: Some(0), ..Default::default() },
            enabled: true,
            next_run: next_run_at,
            last_run: None,
            last_status: None,
        }
    }

    #[tokio::test]
    async fn disabled_schedule_is_skipped_silently() {
        let lock = InProcessLock::new();
        let store = CheckpointStore::new(tempfile::tempdir().unwrap().into_path());
        let coordinator = ScheduleCoordinator::new(lock, Duration::from_secs(60), store, ScanEventBus::default());

        let mut schedule = sample_schedule(Some(Utc::now()));
        schedule.enabled = false;
        let executions = coordinator.tick(std::slice::from_mut(&mut schedule), Utc::now()).await;
        assert!(executions.is_empty());
    }

    #[tokio::test]
    async fn held_lock_produces_skipped_execution() {
        let lock = InProcessLock::new();
        let key = lock_key_for_schedule("sched-1");
        lock.set_if_absent(&key, "someone-else", Duration::from_secs(60)).await;

        let store = CheckpointStore::new(tempfile::tempdir().unwrap().into_path());
        let coordinator = ScheduleCoordinator::new(lock, Duration::from_secs(60), store, ScanEventBus::default());
        let mut schedule = sample_schedule(Some(Utc::now() - chrono::Duration::minutes(1)));

        let executions = coordinator.tick(std::slice::from_mut(&mut schedule), Utc::now()).await;
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].status, ScheduleStatus::Skipped);
    }
}

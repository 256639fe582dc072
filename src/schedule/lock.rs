//! Distributed lock contract, grounded in the Redis+Lua-script lock this
//! system's scheduler originally used: `setIfAbsent`/`compareAndDelete` give
//! mutual exclusion without a central arbiter granting ownership explicitly,
//! and `extend` lets a long-running holder keep its lease.
//!
//! No Redis crate is present in this crate's dependency stack, so the only
//! implementation here is in-process (`Arc<Mutex<HashMap>>`-backed). A
//! fleet-wide deployment would implement the same trait against Redis, etcd,
//! or similar — this crate ships the contract and a single-process backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

/// Generic rather than object-safe: callers are expected to be monomorphic
/// over one lock backend, so this avoids pulling in a trait-object-async
/// helper crate just to support a dispatch style this crate never needs.
pub trait DistributedLock: Send + Sync {
    /// Atomically sets `key` to `value` with the given TTL iff absent or
    /// expired. Returns true on success.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool;

    /// Atomically deletes `key` iff its current value equals `expected`.
    /// Prevents a holder from releasing a lock it no longer owns.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> bool;

    /// Atomically resets `key`'s TTL iff its current value equals `expected`.
    async fn extend(&self, key: &str, expected: &str, ttl: Duration) -> bool;

    /// True if `key` currently holds a non-expired value.
    async fn exists(&self, key: &str) -> bool;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process lock backend. Correct within one OS process; does not provide
/// mutual exclusion across machines.
#[derive(Clone, Default)]
pub struct InProcessLock {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    instance_id: Arc<str>,
}

impl InProcessLock {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            instance_id: Arc::from(Uuid::new_v4().to_string().split('-').next().unwrap_or("inst").to_string()),
        }
    }

    /// Opaque token format `{instance_id}:{uuid}`, matching the original
    /// scheduler's lock-value convention so a holder can be attributed in
    /// logs even though this backend never leaves one process.
    pub fn new_token(&self) -> String {
        format!("{}:{}", self.instance_id, Uuid::new_v4())
    }

    fn is_live(entry: &Entry, now: Instant) -> bool {
        entry.expires_at > now
    }
}

impl DistributedLock for InProcessLock {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(existing) if Self::is_live(existing, now) => false,
            _ => {
                entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at: now + ttl });
                true
            }
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(existing) if existing.value == expected => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    async fn extend(&self, key: &str, expected: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(existing) if existing.value == expected => {
                existing.expires_at = now + ttl;
                true
            }
            _ => false,
        }
    }

    async fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        let entries = self.entries.lock();
        matches!(entries.get(key), Some(e) if Self::is_live(e, now))
    }
}

pub fn lock_key_for_schedule(schedule_id: &str) -> String {
    format!("lock:schedule:{schedule_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_fails_while_held() {
        let lock = InProcessLock::new();
        let token = lock.new_token();
        assert!(lock.set_if_absent("lock:schedule:a", &token, Duration::from_secs(60)).await);
        assert!(!lock.set_if_absent("lock:schedule:a", &lock.new_token(), Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn compare_and_delete_rejects_foreign_token() {
        let lock = InProcessLock::new();
        let token = lock.new_token();
        lock.set_if_absent("lock:schedule:a", &token, Duration::from_secs(60)).await;
        assert!(!lock.compare_and_delete("lock:schedule:a", "someone-else").await);
        assert!(lock.compare_and_delete("lock:schedule:a", &token).await);
    }

    #[tokio::test]
    async fn expired_lock_auto_releases() {
        let lock = InProcessLock::new();
        let token = lock.new_token();
        lock.set_if_absent("lock:schedule:a", &token, Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!lock.exists("lock:schedule:a").await);
        assert!(lock.set_if_absent("lock:schedule:a", &lock.new_token(), Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn extend_requires_matching_token() {
        let lock = InProcessLock::new();
        let token = lock.new_token();
        lock.set_if_absent("lock:schedule:a", &token, Duration::from_millis(20)).await;
        assert!(lock.extend("lock:schedule:a", &token, Duration::from_secs(60)).await);
        assert!(lock.exists("lock:schedule:a").await);
    }
}

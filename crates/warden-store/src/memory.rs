// In-process lock store
// Same contract as the Redis backend, scoped to a single process

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use warden_common::{Result, WardenError};

use crate::model::LockRecord;
use crate::store::{LockStore, ttl_millis};

/// A stored value with its expiry deadline
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory store using DashMap
///
/// Expired entries are treated as absent by every operation and removed
/// lazily; [`MemoryStore::with_sweeper`] additionally purges them in the
/// background. Expiry uses `tokio::time::Instant`, so paused test time drives it.
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
    sweeper: Option<JoinHandle<()>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store without a background sweeper
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            sweeper: None,
        }
    }

    /// Start a background task that drops expired entries every `interval`.
    /// Must be called inside a tokio runtime.
    pub fn with_sweeper(mut self, interval: Duration) -> Self {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }

        let entries = self.entries.clone();
        let period = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = Self::sweep_expired(&entries);
                if removed > 0 {
                    debug!(count = removed, "Cleaned up expired lock records");
                }
            }
        });

        self.sweeper = Some(handle);
        self
    }

    fn sweep_expired(entries: &DashMap<String, StoredValue>) -> usize {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, stored| !stored.is_expired(now));
        before.saturating_sub(entries.len())
    }

    /// Number of records that have not expired yet
    pub fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    /// Number of records physically held, including expired ones not yet purged
    pub fn stored_count(&self) -> usize {
        self.entries.len()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        ttl_millis(ttl)?;
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            WardenError::IllegalArgument(format!("lock ttl {:?} overflows the clock", ttl))
        })?;
        let stored = StoredValue {
            value: value.to_string(),
            expires_at,
        };

        // The entry guard holds the shard lock, so check and insert are one step
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(stored);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if let Some(stored) = self.entries.get(key)
            && !stored.is_expired(now)
        {
            return Ok(Some(stored.value.clone()));
        }

        self.entries.remove_if(key, |_, stored| stored.is_expired(now));
        Ok(None)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self
            .entries
            .remove_if(key, |_, stored| !stored.is_expired(now) && stored.value == expected);
        Ok(removed.is_some())
    }

    async fn inspect(&self, key: &str) -> Result<Option<LockRecord>> {
        let now = Instant::now();
        if let Some(stored) = self.entries.get(key)
            && !stored.is_expired(now)
        {
            let remaining = stored.expires_at.saturating_duration_since(now);
            return Ok(Some(
                LockRecord::new(key, stored.value.clone()).with_remaining_ttl(remaining),
            ));
        }

        self.entries.remove_if(key, |_, stored| stored.is_expired(now));
        Ok(None)
    }
}

// Lock manager: acquire/release protocol over a LockStore
// Holds no lock state; every decision is made by the store

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use warden_common::{Result, WardenError};
use warden_store::store::ttl_millis;
use warden_store::{LockRecord, LockStore};

use crate::token::HolderToken;

const ACQUIRE_TOTAL: &str = "warden_lock_acquire_total";
const RELEASE_TOTAL: &str = "warden_lock_release_total";

const OUTCOME_ACQUIRED: &str = "acquired";
const OUTCOME_CONTENDED: &str = "contended";
const OUTCOME_RELEASED: &str = "released";
const OUTCOME_REJECTED: &str = "rejected";
const OUTCOME_ERROR: &str = "error";

/// Issues acquire and release requests against a shared store
///
/// Cloning is cheap and every clone talks to the same store. Two managers over
/// the same store behave identically for the same key.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn LockStore>,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LockStore> {
        &self.store
    }

    /// Acquire the lock on `key` for `token`, expiring after `ttl`
    ///
    /// Returns `true` if this call created the lock record, `false` if a record
    /// already exists (including one created earlier with the same token; locks
    /// are not reentrant). A `StoreUnavailable` error means the outcome is
    /// unknown, not that the lock was refused.
    pub async fn acquire(&self, key: &str, token: &HolderToken, ttl: Duration) -> Result<bool> {
        validate_key(key)?;
        validate_token(token)?;
        let ttl_ms = ttl_millis(ttl)?;

        match self.store.set_if_absent(key, token.as_str(), ttl).await {
            Ok(true) => {
                metrics::counter!(ACQUIRE_TOTAL, "outcome" => OUTCOME_ACQUIRED).increment(1);
                debug!(key = %key, token = %token, ttl_ms, "Lock acquired");
                Ok(true)
            }
            Ok(false) => {
                metrics::counter!(ACQUIRE_TOTAL, "outcome" => OUTCOME_CONTENDED).increment(1);
                debug!(key = %key, token = %token, "Lock is held by another holder");
                Ok(false)
            }
            Err(e) => {
                metrics::counter!(ACQUIRE_TOTAL, "outcome" => OUTCOME_ERROR).increment(1);
                warn!(
                    key = %key,
                    token = %token,
                    backend = self.store.backend(),
                    error = %e,
                    "Lock acquire failed, outcome unknown"
                );
                Err(e)
            }
        }
    }

    /// Release the lock on `key` if it is still held by `token`
    ///
    /// Returns `true` if this call deleted the record. `false` means there was
    /// no record, or it belongs to someone else (for instance because `token`'s
    /// TTL ran out and another holder acquired the key since).
    pub async fn release(&self, key: &str, token: &HolderToken) -> Result<bool> {
        validate_key(key)?;
        validate_token(token)?;

        match self.store.compare_and_delete(key, token.as_str()).await {
            Ok(true) => {
                metrics::counter!(RELEASE_TOTAL, "outcome" => OUTCOME_RELEASED).increment(1);
                debug!(key = %key, token = %token, "Lock released");
                Ok(true)
            }
            Ok(false) => {
                metrics::counter!(RELEASE_TOTAL, "outcome" => OUTCOME_REJECTED).increment(1);
                debug!(
                    key = %key,
                    token = %token,
                    "Lock release rejected, not held by this token"
                );
                Ok(false)
            }
            Err(e) => {
                metrics::counter!(RELEASE_TOTAL, "outcome" => OUTCOME_ERROR).increment(1);
                warn!(
                    key = %key,
                    token = %token,
                    backend = self.store.backend(),
                    error = %e,
                    "Lock release failed, outcome unknown"
                );
                Err(e)
            }
        }
    }

    /// Token currently stored under `key`, if any
    ///
    /// A point-in-time read; the answer can be outdated as soon as it returns.
    pub async fn current_holder(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        self.store.get(key).await
    }

    /// Whether `key` is held by `token` right now
    pub async fn is_held_by(&self, key: &str, token: &HolderToken) -> Result<bool> {
        let holder = self.current_holder(key).await?;
        Ok(holder.as_deref() == Some(token.as_str()))
    }

    /// Holder and remaining TTL of `key`, read in one round trip
    pub async fn inspect(&self, key: &str) -> Result<Option<LockRecord>> {
        validate_key(key)?;
        self.store.inspect(key).await
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(WardenError::IllegalArgument(
            "lock key must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_token(token: &HolderToken) -> Result<()> {
    if token.as_str().is_empty() {
        return Err(WardenError::IllegalArgument(
            "holder token must not be empty".to_string(),
        ));
    }
    Ok(())
}

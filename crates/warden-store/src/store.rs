//! The store contract consumed by the lock manager

use std::time::Duration;

use async_trait::async_trait;
use warden_common::{Result, WardenError};

use crate::model::LockRecord;

/// Key-value store primitives the lock protocol is built on
///
/// Every method is a single round trip. Implementations must apply
/// `set_if_absent` and `compare_and_delete` atomically with respect to all
/// other operations on the same key, and report transport failures as
/// `WardenError::StoreUnavailable` rather than as a `false` result.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Short backend name used in logs
    fn backend(&self) -> &'static str;

    /// Check that the store answers
    async fn ping(&self) -> Result<()>;

    /// Create `key -> value` expiring after `ttl` iff `key` does not exist.
    /// Returns whether the record was created.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Current value of `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete `key` iff its current value equals `expected`.
    /// Returns whether a record was deleted.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool>;

    /// Value and remaining TTL of `key`, read together
    async fn inspect(&self, key: &str) -> Result<Option<LockRecord>>;
}

/// Longest lease a lock may be acquired for (one year)
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Convert a TTL to whole milliseconds, rejecting anything below 1ms or above [`MAX_TTL`]
pub fn ttl_millis(ttl: Duration) -> Result<u64> {
    if ttl > MAX_TTL {
        return Err(WardenError::IllegalArgument(format!(
            "lock ttl must be at most {:?}, got {:?}",
            MAX_TTL, ttl
        )));
    }
    let millis = ttl.as_millis();
    if millis == 0 {
        return Err(WardenError::IllegalArgument(format!(
            "lock ttl must be at least 1ms, got {:?}",
            ttl
        )));
    }
    Ok(millis as u64)
}

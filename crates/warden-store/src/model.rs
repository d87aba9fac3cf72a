//! Lock record snapshot

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Point-in-time view of a lock record as stored under `key`
///
/// Snapshots are never cached by Warden. By the time a caller looks at one, the
/// record may already have expired or changed hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Protected resource key
    pub key: String,
    /// Holder token currently stored under `key`
    pub holder: String,
    /// Time left before the store drops the record; `None` if the store reports no expiry
    #[serde(default)]
    pub remaining_ttl: Option<Duration>,
}

impl LockRecord {
    pub fn new(key: impl Into<String>, holder: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            holder: holder.into(),
            remaining_ttl: None,
        }
    }

    pub fn with_remaining_ttl(mut self, remaining_ttl: Duration) -> Self {
        self.remaining_ttl = Some(remaining_ttl);
        self
    }

    /// Check if the given token is the holder recorded in this snapshot
    pub fn is_held_by(&self, token: &str) -> bool {
        self.holder == token
    }
}

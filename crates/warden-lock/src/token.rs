//! Holder tokens
//!
//! A token proves ownership of a lock record. It has to be unique across every
//! acquirer racing for a key and every past holder whose record may still be
//! live, so generated tokens combine the caller identity, a nanosecond
//! timestamp and 128 random bits.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_common::{current_time_nanos, local_identity};

/// Opaque value stored as the lock record's value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderToken(String);

impl HolderToken {
    /// Wrap an existing token value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh token for `identity`: `{identity}_{unix_nanos}_{random hex}`
    pub fn generate(identity: &str) -> Self {
        Self(format!(
            "{}_{}_{}",
            identity,
            current_time_nanos(),
            Uuid::new_v4().simple()
        ))
    }

    /// Fresh token using `{hostname}-{pid}` as identity
    pub fn for_this_process() -> Self {
        Self::generate(&local_identity())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for HolderToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for HolderToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for HolderToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HolderToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

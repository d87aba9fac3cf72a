//! Error types for Warden
//!
//! `WardenError` covers every failure the store and lock crates report.
//!
//! A lock that is already held, or a release presented with a token that is
//! not the current holder, is reported as a plain `false` result and never as
//! an error.

use std::fmt::Display;

/// Result alias used by the store and lock crates
pub type Result<T> = std::result::Result<T, WardenError>;

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum WardenError {
    /// The store could not be reached, timed out, or answered with a protocol error.
    /// The outcome of the operation is unknown.
    #[error("store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        operation: &'static str,
        reason: String,
    },

    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl WardenError {
    pub fn store_unavailable(operation: &'static str, reason: impl Display) -> Self {
        WardenError::StoreUnavailable {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Whether the failure leaves the store state unknown
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, WardenError::StoreUnavailable { .. })
    }
}

//! Utility functions for Warden
//!
//! Common helper functions used across the codebase.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in nanoseconds since the UNIX epoch
pub fn current_time_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

/// Identity of the running process: `{hostname}-{pid}`
///
/// Falls back to `localhost` when the host name cannot be read or is not
/// valid UTF-8.
///
/// # Examples
///
/// ```
/// use warden_common::local_identity;
///
/// let identity = local_identity();
/// assert!(identity.ends_with(&format!("-{}", std::process::id())));
/// ```
pub fn local_identity() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}-{}", host, std::process::id())
}

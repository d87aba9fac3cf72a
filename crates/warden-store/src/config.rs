//! Store connection configuration

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_common::{Result, WardenError};

pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5000;

/// Which store implementation backs the lock manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Redis => "redis",
            StoreBackend::Memory => "memory",
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(WardenError::ConfigError(format!(
                "unknown store backend '{}', expected 'redis' or 'memory'",
                other
            ))),
        }
    }
}

/// Store settings, deserialized from the `store` configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Redis URL (`redis://[:password@]host:port/db`)
    pub url: String,
    /// Connection attempts made at start-up
    pub connect_retries: u32,
    pub retry_delay_ms: u64,
    /// Upper bound for a single store round trip
    pub operation_timeout_ms: u64,
    /// Background expiry sweep of the memory backend
    pub sweep_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: DEFAULT_STORE_URL.to_string(),
            connect_retries: DEFAULT_CONNECT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.connect_retries == 0 {
            return Err(WardenError::ConfigError(
                "store.connect_retries must be at least 1".to_string(),
            ));
        }
        if self.operation_timeout_ms == 0 {
            return Err(WardenError::ConfigError(
                "store.operation_timeout_ms must be positive".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(WardenError::ConfigError(
                "store.sweep_interval_ms must be positive".to_string(),
            ));
        }
        if self.backend == StoreBackend::Redis && self.url.trim().is_empty() {
            return Err(WardenError::ConfigError(
                "store.url is required for the redis backend".to_string(),
            ));
        }
        Ok(())
    }

    /// URL with any password replaced, safe to log
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    match rest.rfind('@') {
        Some(at) => format!("{}://***@{}", &url[..scheme_end], &rest[at + 1..]),
        None => url.to_string(),
    }
}

//! Configuration management for the Warden harness
//!
//! Settings are layered: `conf/application.yml` (optional), then environment
//! variables prefixed `WARDEN_` with `__` separating nested keys
//! (`WARDEN_STORE__URL`, `WARDEN_LOGGING__LEVEL`). The command line only
//! carries the positional process id and mode.

use std::fmt::{Display, Formatter};

use clap::{Parser, ValueEnum};
use config::{Config, ConfigError, Environment};
use serde::de::DeserializeOwned;
use warden_common::WardenError;
use warden_store::StoreConfig;

use crate::scenario::ScenarioSettings;
use crate::startup::LoggingConfig;

use super::constants::{
    DEFAULT_CONFIG_FILE, ENV_PREFIX, LOGGING_CONSOLE_PROPERTY, LOGGING_DIR_PROPERTY,
    LOGGING_FILE_PROPERTY, LOGGING_LEVEL_PROPERTY, LOGGING_ROTATION_PROPERTY, SCENARIO_SECTION,
    STORE_SECTION,
};

/// Lock exercise selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Acquire, work for a while, release
    Concurrent,
    /// Show that a wrong token cannot release the lock
    Safety,
    /// Let the lock expire, then try to release it
    Timeout,
}

impl TestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TestMode::Concurrent => "concurrent",
            TestMode::Safety => "safety",
            TestMode::Timeout => "timeout",
        }
    }
}

impl Display for TestMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(
    name = "warden",
    version,
    about = "Exercise the Warden distributed lock against the configured store"
)]
pub struct Cli {
    /// Identifier of this process, embedded in its holder token
    pub process_id: String,

    /// Exercise to run
    #[arg(value_enum, default_value_t = TestMode::Concurrent)]
    pub mode: TestMode,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    /// Load `path` (if it exists) overlaid with `WARDEN_*` environment variables
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(Configuration { config })
    }

    // ========================================================================
    // Store Configuration
    // ========================================================================

    pub fn store_config(&self) -> Result<StoreConfig, WardenError> {
        let store_config: StoreConfig = self.section(STORE_SECTION)?;
        store_config.validate()?;
        Ok(store_config)
    }

    // ========================================================================
    // Scenario Configuration
    // ========================================================================

    pub fn scenario_settings(&self) -> Result<ScenarioSettings, WardenError> {
        let settings: ScenarioSettings = self.section(SCENARIO_SECTION)?;
        settings.validate()?;
        Ok(settings)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGGING_DIR_PROPERTY).ok(),
            self.config.get_bool(LOGGING_CONSOLE_PROPERTY).unwrap_or(true),
            self.config.get_bool(LOGGING_FILE_PROPERTY).unwrap_or(false),
            self.config
                .get_string(LOGGING_LEVEL_PROPERTY)
                .unwrap_or("info".to_string()),
            self.config
                .get_string(LOGGING_ROTATION_PROPERTY)
                .unwrap_or("daily".to_string()),
        )
    }

    /// Deserialize a section, falling back to its defaults when absent
    fn section<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, WardenError> {
        match self.config.get::<T>(key) {
            Ok(value) => Ok(value),
            Err(ConfigError::NotFound(_)) => Ok(T::default()),
            Err(e) => Err(WardenError::ConfigError(format!(
                "invalid '{}' section: {}",
                key, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use warden_store::StoreBackend;

    #[test]
    fn test_cli_positional_arguments() {
        let cli = Cli::try_parse_from(["warden", "1", "safety"]).unwrap();
        assert_eq!(cli.process_id, "1");
        assert_eq!(cli.mode, TestMode::Safety);
    }

    #[test]
    fn test_cli_mode_defaults_to_concurrent() {
        let cli = Cli::try_parse_from(["warden", "worker-a"]).unwrap();
        assert_eq!(cli.mode, TestMode::Concurrent);
    }

    #[test]
    fn test_cli_rejects_unknown_mode_and_missing_id() {
        assert!(Cli::try_parse_from(["warden", "1", "fairness"]).is_err());
        assert!(Cli::try_parse_from(["warden"]).is_err());
        assert!(Cli::try_parse_from(["warden", "1", "timeout", "extra"]).is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(TestMode::Concurrent.to_string(), "concurrent");
        assert_eq!(TestMode::Safety.to_string(), "safety");
        assert_eq!(TestMode::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let configuration = Configuration::from_file("does/not/exist.yml").unwrap();
        let store = configuration.store_config().unwrap();
        assert_eq!(store.backend, StoreBackend::Redis);
        assert_eq!(store.url, "redis://127.0.0.1:6379/0");

        let settings = configuration.scenario_settings().unwrap();
        assert_eq!(settings, ScenarioSettings::default());

        let logging = configuration.logging_config();
        assert!(logging.console_output);
        assert!(!logging.file_logging);
    }

    #[test]
    fn test_default_section_durations() {
        let settings = Configuration::default().scenario_settings().unwrap();
        assert_eq!(settings.concurrent_ttl(), Duration::from_secs(10));
        assert_eq!(settings.timeout_ttl(), Duration::from_secs(5));
    }
}

// Configuration keys and scenario constants

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "WARDEN";

pub const STORE_SECTION: &str = "store";
pub const SCENARIO_SECTION: &str = "scenario";

pub const LOGGING_DIR_PROPERTY: &str = "logging.dir";
pub const LOGGING_CONSOLE_PROPERTY: &str = "logging.console";
pub const LOGGING_FILE_PROPERTY: &str = "logging.file";
pub const LOGGING_LEVEL_PROPERTY: &str = "logging.level";
pub const LOGGING_ROTATION_PROPERTY: &str = "logging.rotation";

// Fixed keys contended by every process running the same mode
pub const CONCURRENT_LOCK_KEY: &str = "test_concurrent_lock";
pub const SAFETY_LOCK_KEY: &str = "test_safety_lock";
pub const TIMEOUT_LOCK_KEY: &str = "test_timeout_lock";

/// Token presented by the safety exercise to prove a stranger cannot release
pub const WRONG_TOKEN: &str = "wrong_value";

pub const DEFAULT_CONCURRENT_TTL_MS: u64 = 10_000;
pub const DEFAULT_WORK_STEPS: u32 = 5;
pub const DEFAULT_WORK_STEP_MS: u64 = 1_000;
pub const DEFAULT_SAFETY_TTL_MS: u64 = 15_000;
pub const DEFAULT_TIMEOUT_TTL_MS: u64 = 5_000;
pub const DEFAULT_EXPIRY_GRACE_MS: u64 = 2_000;

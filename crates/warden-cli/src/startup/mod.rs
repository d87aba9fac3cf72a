//! Process startup utilities for the `warden` binary.

mod logging;

pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};

// Lock exercises run by the `warden` binary
// Each mode contends for one fixed key so several processes can be pitted
// against each other.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warden_common::{Result, WardenError};
use warden_lock::{HolderToken, LockManager};

use crate::model::config::TestMode;
use crate::model::constants::{
    CONCURRENT_LOCK_KEY, DEFAULT_CONCURRENT_TTL_MS, DEFAULT_EXPIRY_GRACE_MS,
    DEFAULT_SAFETY_TTL_MS, DEFAULT_TIMEOUT_TTL_MS, DEFAULT_WORK_STEP_MS, DEFAULT_WORK_STEPS,
    SAFETY_LOCK_KEY, TIMEOUT_LOCK_KEY, WRONG_TOKEN,
};

/// Timings of the exercises, deserialized from the `scenario` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    pub concurrent_ttl_ms: u64,
    /// Simulated work steps while holding the concurrent lock
    pub work_steps: u32,
    pub work_step_ms: u64,
    pub safety_ttl_ms: u64,
    pub timeout_ttl_ms: u64,
    /// Extra wait past the TTL before the timeout exercise releases
    pub expiry_grace_ms: u64,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            concurrent_ttl_ms: DEFAULT_CONCURRENT_TTL_MS,
            work_steps: DEFAULT_WORK_STEPS,
            work_step_ms: DEFAULT_WORK_STEP_MS,
            safety_ttl_ms: DEFAULT_SAFETY_TTL_MS,
            timeout_ttl_ms: DEFAULT_TIMEOUT_TTL_MS,
            expiry_grace_ms: DEFAULT_EXPIRY_GRACE_MS,
        }
    }
}

impl ScenarioSettings {
    pub fn concurrent_ttl(&self) -> Duration {
        Duration::from_millis(self.concurrent_ttl_ms)
    }

    pub fn work_step(&self) -> Duration {
        Duration::from_millis(self.work_step_ms)
    }

    pub fn safety_ttl(&self) -> Duration {
        Duration::from_millis(self.safety_ttl_ms)
    }

    pub fn timeout_ttl(&self) -> Duration {
        Duration::from_millis(self.timeout_ttl_ms)
    }

    /// How long the timeout exercise waits before releasing
    pub fn expiry_wait(&self) -> Duration {
        Duration::from_millis(self.timeout_ttl_ms.saturating_add(self.expiry_grace_ms))
    }

    pub fn validate(&self) -> Result<()> {
        let ttls = [
            ("concurrent_ttl_ms", self.concurrent_ttl_ms),
            ("safety_ttl_ms", self.safety_ttl_ms),
            ("timeout_ttl_ms", self.timeout_ttl_ms),
        ];
        for (name, value) in ttls {
            if value == 0 {
                return Err(WardenError::ConfigError(format!(
                    "scenario.{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// What happened during one exercise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub mode: TestMode,
    pub key: &'static str,
    pub token: String,
    pub acquired: bool,
    /// Result of releasing with `wrong_value` (safety only)
    pub wrong_token_released: Option<bool>,
    /// Result of releasing with our own token, if attempted
    pub released: Option<bool>,
}

impl ScenarioReport {
    fn new(mode: TestMode, key: &'static str, token: &HolderToken, acquired: bool) -> Self {
        Self {
            mode,
            key,
            token: token.to_string(),
            acquired,
            wrong_token_released: None,
            released: None,
        }
    }

    /// Outcomes that contradict the lock guarantees for this mode
    ///
    /// Losing the race is not a violation, and neither is a concurrent holder
    /// whose lock expired mid-work. An empty list means the exercise behaved
    /// as expected.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if !self.acquired {
            return violations;
        }

        match self.mode {
            // Work outliving the ttl is a known limitation, logged by run_concurrent
            TestMode::Concurrent => {}
            TestMode::Safety => {
                if self.wrong_token_released == Some(true) {
                    violations.push(format!("wrong token released the lock on {}", self.key));
                }
                if self.released == Some(false) {
                    violations.push(format!("holder could not release the lock on {}", self.key));
                }
            }
            TestMode::Timeout => {
                if self.released == Some(true) {
                    violations.push(format!(
                        "lock on {} was still held after its ttl elapsed",
                        self.key
                    ));
                }
            }
        }
        violations
    }
}

/// Token used by process `process_id`
pub fn process_token(process_id: &str) -> HolderToken {
    HolderToken::generate(&format!("process_{}", process_id))
}

/// Run the exercise for `mode` as process `process_id`
///
/// Store failures abort the exercise and are returned unchanged.
pub async fn run(
    manager: &LockManager,
    mode: TestMode,
    process_id: &str,
    settings: &ScenarioSettings,
) -> Result<ScenarioReport> {
    let token = process_token(process_id);
    info!(process_id, mode = %mode, token = %token, "Starting lock exercise");

    match mode {
        TestMode::Concurrent => run_concurrent(manager, process_id, &token, settings).await,
        TestMode::Safety => run_safety(manager, process_id, &token, settings).await,
        TestMode::Timeout => run_timeout(manager, process_id, &token, settings).await,
    }
}

async fn run_concurrent(
    manager: &LockManager,
    process_id: &str,
    token: &HolderToken,
    settings: &ScenarioSettings,
) -> Result<ScenarioReport> {
    let key = CONCURRENT_LOCK_KEY;
    let acquired = manager
        .acquire(key, token, settings.concurrent_ttl())
        .await?;
    let mut report = ScenarioReport::new(TestMode::Concurrent, key, token, acquired);

    if !acquired {
        info!(process_id, key, "Lock is held by another process");
        return Ok(report);
    }

    info!(process_id, key, "Lock acquired, starting work");
    for step in 1..=settings.work_steps {
        tokio::time::sleep(settings.work_step()).await;
        info!(process_id, step, total = settings.work_steps, "Working");
    }

    let released = manager.release(key, token).await?;
    if released {
        info!(process_id, key, "Work finished, lock released");
    } else {
        warn!(process_id, key, "Work finished but the lock had already expired");
    }
    report.released = Some(released);
    Ok(report)
}

async fn run_safety(
    manager: &LockManager,
    process_id: &str,
    token: &HolderToken,
    settings: &ScenarioSettings,
) -> Result<ScenarioReport> {
    let key = SAFETY_LOCK_KEY;
    let acquired = manager.acquire(key, token, settings.safety_ttl()).await?;
    let mut report = ScenarioReport::new(TestMode::Safety, key, token, acquired);

    if !acquired {
        info!(process_id, key, "Lock is held by another process");
        return Ok(report);
    }
    info!(process_id, key, "Lock acquired");

    let wrong_released = manager
        .release(key, &HolderToken::new(WRONG_TOKEN))
        .await?;
    info!(
        process_id,
        key,
        released = wrong_released,
        "Release attempted with a wrong token"
    );
    report.wrong_token_released = Some(wrong_released);

    let released = manager.release(key, token).await?;
    info!(process_id, key, released, "Release attempted with own token");
    report.released = Some(released);
    Ok(report)
}

async fn run_timeout(
    manager: &LockManager,
    process_id: &str,
    token: &HolderToken,
    settings: &ScenarioSettings,
) -> Result<ScenarioReport> {
    let key = TIMEOUT_LOCK_KEY;
    let acquired = manager.acquire(key, token, settings.timeout_ttl()).await?;
    let mut report = ScenarioReport::new(TestMode::Timeout, key, token, acquired);

    if !acquired {
        info!(process_id, key, "Lock is held by another process");
        return Ok(report);
    }

    let wait = settings.expiry_wait();
    info!(
        process_id,
        key,
        ttl_ms = settings.timeout_ttl_ms,
        wait_ms = wait.as_millis() as u64,
        "Lock acquired, waiting for it to expire"
    );
    tokio::time::sleep(wait).await;

    let released = manager.release(key, token).await?;
    info!(process_id, key, released, "Release attempted after expiry");
    report.released = Some(released);
    Ok(report)
}

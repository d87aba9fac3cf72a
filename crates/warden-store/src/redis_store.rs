//! Redis lock store
//!
//! Maps the store contract onto Redis commands:
//!
//! | Operation            | Command                                  |
//! |----------------------|------------------------------------------|
//! | `set_if_absent`      | `SET key value NX PX ttl_ms`             |
//! | `get`                | `GET key`                                |
//! | `compare_and_delete` | `EVALSHA <release routine> 1 key token`  |
//! | `inspect`            | `MULTI` / `GET key` / `PTTL key` / `EXEC` |
//! | `ping`               | `PING`                                   |
//!
//! Every round trip is bounded by the configured operation timeout. Redis
//! errors and timeouts both surface as `WardenError::StoreUnavailable`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::RedisResult;
use redis::aio::ConnectionManager;
use tracing::{info, warn};
use warden_common::{Result, WardenError};

use crate::config::StoreConfig;
use crate::model::LockRecord;
use crate::script::ReleaseScript;
use crate::store::{LockStore, ttl_millis};

/// Redis-backed store sharing one multiplexed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    release_script: ReleaseScript,
    operation_timeout: Duration,
}

impl RedisStore {
    /// Connect to the configured server, retrying up to `connect_retries` times
    ///
    /// Each attempt opens the connection, answers a `PING` and preloads the
    /// release routine. The last failure is returned once attempts run out.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            WardenError::ConfigError(format!(
                "invalid store url '{}': {}",
                config.redacted_url(),
                e
            ))
        })?;

        let max_attempts = config.connect_retries;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match Self::try_connect(&client, config).await {
                Ok(store) => {
                    info!(
                        url = %config.redacted_url(),
                        attempt,
                        script = store.release_script.name(),
                        script_version = store.release_script.version(),
                        script_sha = %store.release_script.sha(),
                        "Connected to redis store"
                    );
                    return Ok(store);
                }
                Err(e) => {
                    warn!(
                        url = %config.redacted_url(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "Redis store connection failed"
                    );
                    last_error = Some(e);
                    if attempt < max_attempts {
                        tokio::time::sleep(config.retry_delay()).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            WardenError::store_unavailable("connect", "no connection attempt was made")
        }))
    }

    async fn try_connect(client: &redis::Client, config: &StoreConfig) -> Result<Self> {
        let operation_timeout = config.operation_timeout();
        let connection = bounded(
            "connect",
            operation_timeout,
            client.get_connection_manager(),
        )
        .await?;

        let store = Self {
            connection,
            release_script: ReleaseScript::new(),
            operation_timeout,
        };
        store.ping().await?;
        store.preload_release_script().await?;
        Ok(store)
    }

    async fn preload_release_script(&self) -> Result<()> {
        let mut con = self.connection.clone();
        let sha = bounded(
            "script_load",
            self.operation_timeout,
            self.release_script.load(&mut con),
        )
        .await?;

        if sha != self.release_script.sha() {
            // EVALSHA would miss on every call and fall back to EVAL
            warn!(
                expected = %self.release_script.sha(),
                actual = %sha,
                "Server computed a different digest for the release routine"
            );
        }
        Ok(())
    }

    pub fn release_script(&self) -> &ReleaseScript {
        &self.release_script
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }
}

/// Run one round trip under `timeout`, mapping every failure to `StoreUnavailable`
async fn bounded<T, F>(operation: &'static str, timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(WardenError::store_unavailable(operation, e)),
        Err(_) => Err(WardenError::store_unavailable(
            operation,
            format!("timed out after {}ms", timeout.as_millis()),
        )),
    }
}

#[async_trait]
impl LockStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<()> {
        let mut con = self.connection.clone();
        let cmd = redis::cmd("PING");
        let _pong: String = bounded("ping", self.operation_timeout, cmd.query_async(&mut con)).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let ttl_ms = ttl_millis(ttl)?;
        let mut con = self.connection.clone();

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX").arg("PX").arg(ttl_ms);

        // "OK" when created, nil when the key already exists
        let reply: Option<String> = bounded(
            "set_if_absent",
            self.operation_timeout,
            cmd.query_async(&mut con),
        )
        .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.connection.clone();

        let mut cmd = redis::cmd("GET");
        cmd.arg(key);

        bounded("get", self.operation_timeout, cmd.query_async(&mut con)).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        let mut con = self.connection.clone();
        let deleted = bounded(
            "compare_and_delete",
            self.operation_timeout,
            self.release_script.invoke(&mut con, key, expected),
        )
        .await?;
        Ok(deleted == 1)
    }

    async fn inspect(&self, key: &str) -> Result<Option<LockRecord>> {
        let mut con = self.connection.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().cmd("GET").arg(key).cmd("PTTL").arg(key);

        let (value, pttl): (Option<String>, i64) =
            bounded("inspect", self.operation_timeout, pipe.query_async(&mut con)).await?;

        Ok(value.map(|holder| {
            let record = LockRecord::new(key, holder);
            // PTTL: -1 when the key has no expiry, -2 when it vanished in between
            if pttl >= 0 {
                record.with_remaining_ttl(Duration::from_millis(pttl as u64))
            } else {
                record
            }
        }))
    }
}

//! Warden Store - the key-value store contract behind Warden locks
//!
//! This crate provides:
//! - The [`LockStore`] trait: conditional create with expiry, plain read and
//!   atomic compare-then-delete
//! - [`RedisStore`]: Redis backend (`SET NX PX`, `GET`, `EVALSHA`)
//! - [`MemoryStore`]: in-process backend with the same semantics, for tests and
//!   single-process use
//! - [`ReleaseScript`]: the named, versioned compare-and-delete routine
//! - Store configuration

use std::sync::Arc;

use tracing::info;

pub mod config;
pub mod memory;
pub mod model;
pub mod redis_store;
pub mod script;
pub mod store;

// Re-export commonly used types
pub use config::{StoreBackend, StoreConfig};
pub use memory::MemoryStore;
pub use model::LockRecord;
pub use redis_store::RedisStore;
pub use script::{RELEASE_SCRIPT_NAME, RELEASE_SCRIPT_VERSION, ReleaseScript};
pub use store::LockStore;

use warden_common::Result;

/// Build the store selected by `config.backend`
///
/// The Redis backend is connected (with retries) before this returns, so an
/// unreachable server surfaces here as `StoreUnavailable`.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn LockStore>> {
    config.validate()?;

    match config.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!(
                sweep_interval_ms = config.sweep_interval_ms,
                "Using in-process memory store; locks are not shared with other processes"
            );
            Ok(Arc::new(
                MemoryStore::new().with_sweeper(config.sweep_interval()),
            ))
        }
    }
}

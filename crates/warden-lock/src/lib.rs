//! Warden Lock - distributed mutual exclusion over a shared key-value store
//!
//! The store is the coordinator. [`LockManager`] keeps no lock state of its own:
//!
//! - `acquire` creates `key -> token` with a TTL only if `key` is absent
//! - `release` deletes `key` only if it still holds the caller's token, in one
//!   atomic store-side step
//! - an abandoned lock disappears when its TTL elapses
//!
//! # Limitations
//!
//! There is no lease renewal and no fencing token. A holder whose work runs
//! past its TTL loses the lock without notice, and a new holder may acquire
//! the key while the old one is still working. The old holder's `release`
//! then returns `false` and leaves the new holder's record alone. Choose a TTL
//! comfortably longer than the critical section.
//!
//! Retrying after a `false` acquire is left to the caller.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use warden_lock::{HolderToken, LockManager};
//! use warden_store::{RedisStore, StoreConfig};
//!
//! # async fn run() -> warden_common::Result<()> {
//! let store = RedisStore::connect(&StoreConfig::redis("redis://127.0.0.1:6379/0")).await?;
//! let manager = LockManager::new(Arc::new(store));
//!
//! let token = HolderToken::for_this_process();
//! if manager.acquire("orders", &token, Duration::from_secs(30)).await? {
//!     // critical section
//!     manager.release("orders", &token).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod manager;
pub mod token;

pub use manager::LockManager;
pub use token::HolderToken;

// Re-export store types callers need alongside the manager
pub use warden_store::{LockRecord, LockStore, MemoryStore};

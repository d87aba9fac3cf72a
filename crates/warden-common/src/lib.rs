//! Warden Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all Warden components:
//! - Error taxonomy shared by the store and lock crates
//! - Time and host identity helpers

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, WardenError};
pub use utils::{current_time_nanos, local_identity};

//! Warden CLI - harness for the Warden distributed lock
//!
//! `warden <process-id> [concurrent|safety|timeout]` connects to the configured
//! store and runs one lock exercise against a fixed key. Start several
//! processes with different ids to watch them compete.

pub mod model;
pub mod scenario;
pub mod startup;

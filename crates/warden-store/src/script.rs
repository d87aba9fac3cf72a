//! Server-side release routine
//!
//! Release must compare the stored holder and delete it in one indivisible
//! step. The routine is identified by its SHA1 digest and invoked with
//! `EVALSHA`; the source is only sent when the server does not know it yet
//! (`SCRIPT LOAD` at connect, or the transparent `NOSCRIPT` fallback).
//!
//! The name and version are part of the source, so bumping the version yields
//! a new digest and old and new clients never share a cached routine by accident.

use redis::aio::ConnectionLike;
use redis::{RedisResult, Script};

pub const RELEASE_SCRIPT_NAME: &str = "warden_release_if_holder";
pub const RELEASE_SCRIPT_VERSION: u32 = 1;

const RELEASE_SCRIPT_SOURCE: &str = r#"-- warden_release_if_holder v1
-- KEYS[1]: lock key, ARGV[1]: holder token presented by the caller
-- Returns 1 when the record held ARGV[1] and was deleted, 0 otherwise
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// The compare-and-delete routine behind `LockStore::compare_and_delete`
#[derive(Debug, Clone)]
pub struct ReleaseScript {
    script: Script,
}

impl Default for ReleaseScript {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseScript {
    pub fn new() -> Self {
        Self {
            script: Script::new(RELEASE_SCRIPT_SOURCE),
        }
    }

    pub fn name(&self) -> &'static str {
        RELEASE_SCRIPT_NAME
    }

    pub fn version(&self) -> u32 {
        RELEASE_SCRIPT_VERSION
    }

    /// SHA1 identifier the server knows the routine by
    pub fn sha(&self) -> &str {
        self.script.get_hash()
    }

    pub fn source(&self) -> &'static str {
        RELEASE_SCRIPT_SOURCE
    }

    /// Register the routine in the server's script cache, returning the digest
    /// the server computed
    pub async fn load<C: ConnectionLike>(&self, con: &mut C) -> RedisResult<String> {
        let mut cmd = redis::cmd("SCRIPT");
        cmd.arg("LOAD").arg(RELEASE_SCRIPT_SOURCE);
        cmd.query_async(con).await
    }

    /// Run the routine for `key`; returns the number of deleted records (0 or 1)
    pub async fn invoke<C: ConnectionLike>(
        &self,
        con: &mut C,
        key: &str,
        expected: &str,
    ) -> RedisResult<i64> {
        let mut invocation = self.script.prepare_invoke();
        invocation.key(key).arg(expected);
        invocation.invoke_async(con).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let script = ReleaseScript::new();
        assert_eq!(script.name(), "warden_release_if_holder");
        assert_eq!(script.version(), 1);
        assert!(script.source().starts_with("-- warden_release_if_holder v1"));
    }

    #[test]
    fn test_sha_is_stable_hex_digest() {
        let first = ReleaseScript::new();
        let second = ReleaseScript::default();
        assert_eq!(first.sha(), second.sha());
        assert_eq!(first.sha().len(), 40);
        assert!(first.sha().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_source_compares_before_deleting() {
        let source = ReleaseScript::new().source();
        let get = source.find("redis.call(\"GET\", KEYS[1]) == ARGV[1]").unwrap();
        let del = source.find("redis.call(\"DEL\", KEYS[1])").unwrap();
        assert!(get < del);
        assert!(source.contains("return 0"));
    }
}

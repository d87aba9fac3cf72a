// Integration tests for LockManager
// Exercises the lock protocol guarantees against the in-process store

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use warden_common::{Result, WardenError};
use warden_lock::{HolderToken, LockManager, LockRecord, LockStore, MemoryStore};

fn memory_manager() -> LockManager {
    LockManager::new(Arc::new(MemoryStore::new()))
}

/// Race `contenders` distinct tokens for `key` and return the winners
async fn race(manager: &LockManager, key: &str, contenders: usize, ttl: Duration) -> Vec<HolderToken> {
    let attempts = (0..contenders).map(|i| {
        let manager = manager.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let token = HolderToken::generate(&format!("task_{}", i));
            let acquired = manager.acquire(&key, &token, ttl).await?;
            Ok::<_, WardenError>(acquired.then_some(token))
        })
    });

    let mut winners = Vec::new();
    for outcome in futures::future::join_all(attempts).await {
        if let Some(token) = outcome.expect("task panicked").expect("store error") {
            winners.push(token);
        }
    }
    winners
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mutual_exclusion_under_contention() {
    let manager = memory_manager();

    let winners = race(&manager, "L", 10, Duration::from_secs(5)).await;

    assert_eq!(winners.len(), 1, "exactly one contender may hold the lock");
    assert!(manager.release("L", &winners[0]).await.unwrap());
    assert_eq!(manager.current_holder("L").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_race_condition_twenty_contenders() {
    let manager = memory_manager();

    let winners = race(&manager, "test_race_lock", 20, Duration::from_secs(3)).await;

    assert_eq!(winners.len(), 1);
    assert!(
        manager
            .is_held_by("test_race_lock", &winners[0])
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_stale_value_rejection() {
    let manager = memory_manager();
    let a1 = HolderToken::new("A1");
    let b1 = HolderToken::new("B1");

    assert!(manager.acquire("L", &a1, Duration::from_secs(10)).await.unwrap());

    // B never held the lock
    assert!(!manager.release("L", &b1).await.unwrap());
    assert_eq!(
        manager.current_holder("L").await.unwrap().as_deref(),
        Some("A1")
    );

    assert!(manager.release("L", &a1).await.unwrap());
}

#[tokio::test]
async fn test_idempotent_release() {
    let manager = memory_manager();
    let token = HolderToken::generate("worker");

    manager
        .acquire("L", &token, Duration::from_secs(10))
        .await
        .unwrap();

    assert!(manager.release("L", &token).await.unwrap());
    assert!(!manager.release("L", &token).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_liveness_via_expiry() {
    let manager = memory_manager();
    let t1 = HolderToken::generate("t1");
    let t2 = HolderToken::generate("t2");

    assert!(manager.acquire("L", &t1, Duration::from_secs(2)).await.unwrap());
    assert!(!manager.acquire("L", &t2, Duration::from_secs(2)).await.unwrap());

    tokio::time::sleep(Duration::from_millis(2100)).await;

    // The abandoned record no longer blocks
    assert!(manager.acquire("L", &t2, Duration::from_secs(2)).await.unwrap());
    assert!(manager.is_held_by("L", &t2).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_expired_holder_cannot_release_successor() {
    let manager = memory_manager();
    let slow = HolderToken::generate("slow");
    let next = HolderToken::generate("next");

    assert!(manager.acquire("L", &slow, Duration::from_secs(1)).await.unwrap());

    // Work outlives the TTL; no renewal happens
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!manager.is_held_by("L", &slow).await.unwrap());

    assert!(manager.acquire("L", &next, Duration::from_secs(10)).await.unwrap());

    // The stale holder's release is rejected and the successor keeps the lock
    assert!(!manager.release("L", &slow).await.unwrap());
    assert!(manager.is_held_by("L", &next).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_inspect_tracks_remaining_ttl() {
    let manager = memory_manager();
    let token = HolderToken::generate("inspector");

    manager
        .acquire("L", &token, Duration::from_secs(3))
        .await
        .unwrap();

    for elapsed in 1..=2u64 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let record = manager.inspect("L").await.unwrap().unwrap();
        assert!(record.is_held_by(token.as_str()));
        assert_eq!(
            record.remaining_ttl,
            Some(Duration::from_secs(3 - elapsed))
        );
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(manager.inspect("L").await.unwrap(), None);
}

#[tokio::test]
async fn test_keys_do_not_interfere() {
    let manager = memory_manager();
    let token = HolderToken::generate("multi");
    let ttl = Duration::from_secs(10);

    assert!(manager.acquire("orders", &token, ttl).await.unwrap());
    assert!(manager.acquire("invoices", &token, ttl).await.unwrap());
    assert!(manager.release("orders", &token).await.unwrap());
    assert!(manager.is_held_by("invoices", &token).await.unwrap());
}

/// Store that cannot be reached
struct UnreachableStore {
    calls: AtomicUsize,
}

impl UnreachableStore {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn fail<T>(&self, operation: &'static str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(WardenError::store_unavailable(operation, "connection refused"))
    }
}

#[async_trait]
impl LockStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    async fn ping(&self) -> Result<()> {
        self.fail("ping")
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<bool> {
        self.fail("set_if_absent")
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.fail("get")
    }

    async fn compare_and_delete(&self, _key: &str, _expected: &str) -> Result<bool> {
        self.fail("compare_and_delete")
    }

    async fn inspect(&self, _key: &str) -> Result<Option<LockRecord>> {
        self.fail("inspect")
    }
}

#[tokio::test]
async fn test_store_failure_is_not_a_refusal() {
    let store = Arc::new(UnreachableStore::new());
    let manager = LockManager::new(store.clone());
    let token = HolderToken::generate("worker");

    let err = manager
        .acquire("L", &token, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(err.is_store_unavailable());

    let err = manager.release("L", &token).await.unwrap_err();
    assert!(matches!(
        err,
        WardenError::StoreUnavailable {
            operation: "compare_and_delete",
            ..
        }
    ));

    assert!(manager.current_holder("L").await.unwrap_err().is_store_unavailable());

    // One round trip per call, no hidden retries
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_invalid_arguments_never_reach_the_store() {
    let store = Arc::new(UnreachableStore::new());
    let manager = LockManager::new(store.clone());

    let err = manager
        .acquire("", &HolderToken::generate("w"), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, WardenError::IllegalArgument(_)));

    let err = manager
        .acquire("L", &HolderToken::generate("w"), Duration::from_micros(10))
        .await
        .unwrap_err();
    assert!(matches!(err, WardenError::IllegalArgument(_)));

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversized_ttl_is_an_illegal_argument() {
    let manager = memory_manager();
    let token = HolderToken::generate("forever");

    let err = manager
        .acquire("L", &token, Duration::from_secs(u64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, WardenError::IllegalArgument(_)));
    assert_eq!(manager.current_holder("L").await.unwrap(), None);

    // Rejected before the store sees it
    let store = Arc::new(UnreachableStore::new());
    let err = LockManager::new(store.clone())
        .acquire("L", &token, warden_store::store::MAX_TTL + Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, WardenError::IllegalArgument(_)));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);

    // The longest allowed lease still works
    assert!(
        manager
            .acquire("L", &token, warden_store::store::MAX_TTL)
            .await
            .unwrap()
    );
}

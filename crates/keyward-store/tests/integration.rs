//! Integration tests for the keyward-store crate.
//!
//! These tests drive the public store API against the in-memory vault:
//! upsert, case-insensitive addressing, the not-found/corrupt distinction,
//! listing and scoped deletion, sharing groups, biometric gating and the
//! async twins.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keyward_store::{
    Accessibility, AuthFailure, AuthRequirement, Authenticator, BiometricGate, JsonCodec,
    MemoryVault, SaveOptions, SecureItemStore, StoreConfig, StoreError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    token: String,
    expires_in: u64,
}

fn session(token: &str) -> Session {
    Session {
        user: "alice".into(),
        token: token.into(),
        expires_in: 3600,
    }
}

/// Route store logs to the test harness. Set `RUST_LOG=keyward_store=debug`
/// to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_store() -> SecureItemStore<MemoryVault> {
    init_tracing();
    SecureItemStore::new(MemoryVault::new())
}

fn opts() -> SaveOptions {
    SaveOptions::default()
}

// ═══════════════════════════════════════════════════════════════════════
//  Lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn save_read_delete() {
    let store = test_store();
    store.save(&session("t1"), "auth", "alice", &opts()).unwrap();

    let back: Session = store.read("auth", "alice", None).unwrap();
    assert_eq!(back, session("t1"));
    assert!(store.exists("auth", "alice"));

    store.delete("auth", "alice").unwrap();
    assert!(!store.exists("auth", "alice"));
    assert!(matches!(
        store.read::<Session>("auth", "alice", None),
        Err(StoreError::ItemNotFound)
    ));
}

#[test]
fn delete_twice_succeeds() {
    let store = test_store();
    store.save(&1u8, "svc", "id", &opts()).unwrap();
    store.delete("svc", "id").unwrap();
    store.delete("svc", "id").unwrap();
    store.delete("never", "created").unwrap();
}

#[test]
fn save_twice_keeps_one_entry_with_latest_payload() {
    let store = test_store();
    store.save(&session("first"), "auth", "alice", &opts()).unwrap();
    store.save(&session("second"), "auth", "alice", &opts()).unwrap();

    assert_eq!(store.vault().len(), 1);
    assert_eq!(store.list_all(None).unwrap().len(), 1);
    let back: Session = store.read("auth", "alice", None).unwrap();
    assert_eq!(back.token, "second");
}

#[test]
fn addressing_is_case_insensitive() {
    let store = test_store();
    store.save(&"value", "Foo", "Bar", &opts()).unwrap();

    let back: String = store.read("foo", "bar", None).unwrap();
    assert_eq!(back, "value");
    assert!(store.exists("FOO", "BAR"));

    // Mixed-case save over an existing entry is an update, not a second entry.
    store.save(&"other", "FOO", "bar", &opts()).unwrap();
    assert_eq!(store.vault().len(), 1);

    let records = store.list_all(Some("fOo")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].namespace, "foo");
    assert_eq!(records[0].identifier, "bar");
}

#[test]
fn never_saved_is_not_found_and_wrong_type_is_invalid() {
    let store = test_store();
    assert!(matches!(
        store.read::<Session>("auth", "nobody", None),
        Err(StoreError::ItemNotFound)
    ));

    store.save(&42u64, "auth", "counter", &opts()).unwrap();
    assert!(matches!(
        store.read::<Session>("auth", "counter", None),
        Err(StoreError::InvalidData { .. })
    ));
}

#[test]
fn exists_never_errors() {
    let store = test_store();
    assert!(!store.exists("svc", "missing"));
    assert!(!store.exists("", ""));
    assert!(!store.exists("\u{0}", "\u{feff}"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Listing and bulk delete
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn list_reflects_filter() {
    let store = test_store();
    store.save(&1, "svc1", "a", &opts()).unwrap();
    store.save(&2, "svc1", "b", &opts()).unwrap();
    store.save(&3, "svc2", "c", &opts()).unwrap();

    assert_eq!(store.list_all(Some("svc1")).unwrap().len(), 2);
    assert_eq!(store.list_all(None).unwrap().len(), 3);
    assert!(store.list_all(Some("svc3")).unwrap().is_empty());
}

#[test]
fn records_carry_timestamps() {
    let store = test_store();
    store.save(&1, "svc", "a", &opts()).unwrap();
    let first = store.read_record("svc", "a").unwrap();
    assert!(first.created_at.is_some());
    assert!(first.modified_at.is_some());

    store.save(&2, "svc", "a", &opts()).unwrap();
    let second = store.read_record("svc", "a").unwrap();
    assert_eq!(first.created_at, second.created_at);
    assert!(second.modified_at >= first.modified_at);

    assert!(matches!(
        store.read_record("svc", "zzz"),
        Err(StoreError::ItemNotFound)
    ));
}

#[test]
fn delete_all_is_scoped() {
    let store = test_store();
    store.save(&1, "svc1", "a", &opts()).unwrap();
    store.save(&2, "svc1", "b", &opts()).unwrap();
    store.save(&3, "svc2", "c", &opts()).unwrap();

    store.delete_all(Some("svc1")).unwrap();
    assert!(store.list_all(Some("svc1")).unwrap().is_empty());
    let kept: i32 = store.read("svc2", "c", None).unwrap();
    assert_eq!(kept, 3);

    store.delete_all(None).unwrap();
    assert!(store.vault().is_empty());
    // Nothing left: still success.
    store.delete_all(None).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════
//  Insert-only and update-only
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn create_rejects_existing_entry() {
    let store = test_store();
    store.create(&1, "svc", "a", &opts()).unwrap();
    assert!(matches!(
        store.create(&2, "SVC", "A", &opts()),
        Err(StoreError::DuplicateItem)
    ));
    let back: i32 = store.read("svc", "a", None).unwrap();
    assert_eq!(back, 1);
}

#[test]
fn update_requires_existing_entry() {
    let store = test_store();
    assert!(matches!(
        store.update(&1, "svc", "a", Accessibility::WhenUnlocked),
        Err(StoreError::ItemNotFound)
    ));

    store.save(&1, "svc", "a", &opts()).unwrap();
    store
        .update(&2, "svc", "a", Accessibility::AfterFirstUnlock)
        .unwrap();
    let back: i32 = store.read("svc", "a", None).unwrap();
    assert_eq!(back, 2);
}

// ═══════════════════════════════════════════════════════════════════════
//  Sharing groups
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn sharing_group_scopes_every_operation() {
    let vault = Arc::new(MemoryVault::new());
    let shared = SecureItemStore::with_config(
        Arc::clone(&vault),
        JsonCodec,
        StoreConfig::new().with_access_group("TEAM.shared"),
    );
    let other = SecureItemStore::with_config(
        Arc::clone(&vault),
        JsonCodec,
        StoreConfig::new().with_access_group("TEAM.other"),
    );

    shared.save(&"s", "svc", "a", &opts()).unwrap();
    other.save(&"o", "svc", "a", &opts()).unwrap();
    assert_eq!(vault.len(), 2);

    let s: String = shared.read("svc", "a", None).unwrap();
    let o: String = other.read("svc", "a", None).unwrap();
    assert_eq!((s.as_str(), o.as_str()), ("s", "o"));

    assert_eq!(shared.list_all(None).unwrap().len(), 1);
    shared.delete_all(None).unwrap();
    assert!(!shared.exists("svc", "a"));
    assert!(other.exists("svc", "a"));
}

#[test]
fn store_clones_share_configuration() {
    let store = SecureItemStore::with_config(
        MemoryVault::new(),
        JsonCodec,
        StoreConfig::new().with_access_group("grp"),
    );
    let clone = store.clone();
    store.save(&5, "svc", "a", &opts()).unwrap();
    assert_eq!(clone.access_group(), Some("grp"));
    let back: i32 = clone.read("svc", "a", None).unwrap();
    assert_eq!(back, 5);
}

// ═══════════════════════════════════════════════════════════════════════
//  Biometric gating
// ═══════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
struct CountingAuth {
    calls: Arc<AtomicUsize>,
    deny: bool,
}

impl Authenticator for CountingAuth {
    fn authenticate(
        &self,
        reason: &str,
        requirement: AuthRequirement,
    ) -> Result<(), AuthFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!reason.is_empty());
        assert_eq!(requirement, AuthRequirement::UserPresence);
        if self.deny {
            Err(AuthFailure::Failed)
        } else {
            Ok(())
        }
    }
}

#[test]
fn gated_item_runs_ceremony_on_read() {
    let auth = CountingAuth::default();
    let store = SecureItemStore::new(MemoryVault::new().with_authenticator(auth.clone()));

    let options = SaveOptions::new()
        .with_accessibility(Accessibility::WhenPasscodeSet)
        .with_biometric(BiometricGate::required("Unlock your session"));
    store.save(&session("gated"), "auth", "alice", &options).unwrap();

    let back: Session = store
        .read("auth", "alice", Some("Show your session"))
        .unwrap();
    assert_eq!(back.token, "gated");
    assert_eq!(auth.calls.load(Ordering::SeqCst), 1);

    // Existence and listing never prompt.
    assert!(store.exists("auth", "alice"));
    assert_eq!(store.list_all(None).unwrap().len(), 1);
    assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_ceremony_is_store_failure_not_not_found() {
    let auth = CountingAuth {
        deny: true,
        ..Default::default()
    };
    let store = SecureItemStore::new(MemoryVault::new().with_authenticator(auth));
    let options = SaveOptions::new().with_biometric(BiometricGate::required("Unlock"));
    store.save(&1, "svc", "a", &options).unwrap();

    let err = store.read::<i32>("svc", "a", Some("Unlock")).unwrap_err();
    assert!(matches!(err, StoreError::StoreFailure { status: -25293 }));
}

#[test]
fn ungated_item_never_prompts() {
    let auth = CountingAuth {
        deny: true,
        ..Default::default()
    };
    let store = SecureItemStore::new(MemoryVault::new().with_authenticator(auth.clone()));
    store.save(&1, "svc", "a", &opts()).unwrap();

    let back: i32 = store.read("svc", "a", Some("unused")).unwrap();
    assert_eq!(back, 1);
    assert_eq!(auth.calls.load(Ordering::SeqCst), 0);
}

// ═══════════════════════════════════════════════════════════════════════
//  Async twins
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn async_lifecycle() {
    let store = test_store();
    store
        .save_async(session("async"), "Auth", "Alice", opts())
        .await
        .unwrap();

    let back: Session = store.read_async("auth", "alice", None).await.unwrap();
    assert_eq!(back.token, "async");
    assert!(store.exists_async("auth", "alice").await);

    let record = store.read_record_async("auth", "alice").await.unwrap();
    assert_eq!(record.namespace, "auth");

    assert!(matches!(
        store.create_async(1, "auth", "alice", opts()).await,
        Err(StoreError::DuplicateItem)
    ));
    store
        .update_async(session("updated"), "auth", "alice", Accessibility::WhenUnlocked)
        .await
        .unwrap();

    assert_eq!(store.list_all_async(None).await.unwrap().len(), 1);
    store.delete_async("auth", "alice").await.unwrap();
    store.delete_async("auth", "alice").await.unwrap();
    assert!(!store.exists_async("auth", "alice").await);

    assert!(matches!(
        store.read_async::<Session>("auth", "alice", None).await,
        Err(StoreError::ItemNotFound)
    ));
}

#[tokio::test]
async fn async_delete_all_scoped() {
    let store = test_store();
    store.save_async(1, "svc1", "a", opts()).await.unwrap();
    store.save_async(2, "svc2", "b", opts()).await.unwrap();

    store.delete_all_async(Some("svc1".into())).await.unwrap();
    assert!(store.list_all_async(Some("svc1".into())).await.unwrap().is_empty());
    assert_eq!(store.list_all_async(None).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_to_distinct_entries() {
    let store = test_store();
    let mut handles = Vec::new();
    for i in 0..16u32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .save_async(i, "bulk", format!("item-{i}"), SaveOptions::default())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(store.list_all(Some("bulk")).unwrap().len(), 16);
}

// ═══════════════════════════════════════════════════════════════════════
//  Round trips
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn assorted_values_round_trip() {
    let store = test_store();

    store.save(&"plain text", "rt", "str", &opts()).unwrap();
    store.save(&vec![1u8, 2, 3], "rt", "bytes", &opts()).unwrap();
    store.save(&Option::<u32>::None, "rt", "none", &opts()).unwrap();
    store.save(&session("s"), "rt", "struct", &opts()).unwrap();

    assert_eq!(store.read::<String>("rt", "str", None).unwrap(), "plain text");
    assert_eq!(store.read::<Vec<u8>>("rt", "bytes", None).unwrap(), vec![1, 2, 3]);
    assert_eq!(store.read::<Option<u32>>("rt", "none", None).unwrap(), None);
    assert_eq!(store.read::<Session>("rt", "struct", None).unwrap(), session("s"));
}

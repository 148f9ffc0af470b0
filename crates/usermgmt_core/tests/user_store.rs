use serde_json::json;
use std::sync::Arc;
use std::thread;
use usermgmt_core::{StoreError, User, UserStore, DEFAULT_LOCK_TIMEOUT};

fn record(id: u64, name: &str) -> serde_json::Value {
    json!({"id": id, "name": name, "email": format!("user{id}@example.com")})
}

#[test]
fn add_get_list_count_follow_insertion_order() {
    let store = UserStore::new();
    store.add(&record(3, "Yun Heihachi")).unwrap();
    store.add(&record(1, "Karl Gekot")).unwrap();
    store.add(&record(2, "Stive Jarviz")).unwrap();

    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.get(1).unwrap().name(), "Karl Gekot");
    let ids: Vec<u64> = store.list().unwrap().iter().map(User::id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    // Listing is restartable.
    assert_eq!(store.list().unwrap().len(), 3);
}

#[test]
fn invalid_or_duplicate_add_leaves_store_unchanged() {
    let store = UserStore::new();
    store.add(&record(1, "Karl Gekot")).unwrap();
    let before = store.list().unwrap();

    let duplicate = store.add(&record(1, "Someone Else")).unwrap_err();
    assert_eq!(duplicate, StoreError::DuplicateId(1));

    let invalid = store.add(&json!({"id": 2, "name": "X"})).unwrap_err();
    assert!(matches!(invalid, StoreError::ValidationFailed(_)));

    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.list().unwrap(), before);
}

#[test]
fn remove_returns_record_and_missing_id_is_not_found() {
    let store = UserStore::new();
    store.add(&record(1, "Karl Gekot")).unwrap();

    let removed = store.remove(1).unwrap();
    assert_eq!(removed.id(), 1);
    assert_eq!(store.count().unwrap(), 0);

    store.add(&record(2, "Stive Jarviz")).unwrap();
    assert_eq!(store.remove(999).unwrap_err(), StoreError::NotFound(999));
    assert_eq!(store.get(999).unwrap_err(), StoreError::NotFound(999));
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn concurrent_adds_keep_ids_unique() {
    let store = Arc::new(UserStore::new());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut accepted = 0;
                // Every worker races for the same 50 ids.
                for id in 1..=50u64 {
                    if store.add(&record(id, &format!("Worker {worker}"))).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(accepted, 50);
    assert_eq!(store.count().unwrap(), 50);
}

#[test]
fn default_store_uses_default_lock_timeout() {
    assert_eq!(UserStore::new().lock_timeout(), DEFAULT_LOCK_TIMEOUT);
}

#[test]
fn clear_reports_dropped_count() {
    let store = UserStore::new();
    store.add(&record(1, "Karl Gekot")).unwrap();
    store.add(&record(2, "Stive Jarviz")).unwrap();
    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.list().unwrap().is_empty());
}

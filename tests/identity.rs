//! Persisted-identity equality, exercised through the store rather than on
//! bare structs: what comes back from a fetch must equal what was inserted.

use chatlog_store::Database;
use chatlog_store::model::{Identity, Service, ServiceKind, User, UserKind};
use std::hash::{DefaultHasher, Hash, Hasher};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[tokio::test]
async fn test_fetched_equals_inserted() {
    let db = Database::new(":memory:").await.unwrap();

    let inserted = db
        .services()
        .insert(&Service::new(ServiceKind::Irc, "libera", "irc.libera.chat"))
        .await
        .unwrap();
    let fetched = db
        .services()
        .find_by_id(inserted.id.unwrap())
        .await
        .unwrap();

    assert_eq!(inserted, fetched);
    assert_eq!(hash_of(&inserted), hash_of(&fetched));
    assert_eq!(inserted, inserted);
}

#[tokio::test]
async fn test_distinct_rows_unequal_despite_identical_fields() {
    let db = Database::new(":memory:").await.unwrap();

    let template = Service::new(ServiceKind::Plain, "twin", "twin");
    let a = db.services().insert(&template).await.unwrap();
    let b = db.services().insert(&template).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_transient_unequal_to_persisted_twin() {
    let db = Database::new(":memory:").await.unwrap();

    let transient = Service::new(ServiceKind::Plain, "s", "s");
    let persisted = db.services().insert(&transient).await.unwrap();

    assert_ne!(transient, persisted);
    assert!(transient.entity_key().is_none());

    let key = persisted.entity_key().unwrap();
    assert_eq!(key.table, "service");
    assert_eq!(key.id, persisted.id.unwrap());
}

#[tokio::test]
async fn test_equality_respects_entity_type() {
    let db = Database::new(":memory:").await.unwrap();

    let service = db
        .services()
        .insert(&Service::new(ServiceKind::Plain, "s", "s"))
        .await
        .unwrap();
    let user = db
        .users()
        .insert(&User::new(
            UserKind::Plain,
            service.id.unwrap(),
            "u",
            "u",
        ))
        .await
        .unwrap();

    // Same numeric id, different tables: the keys differ.
    assert_eq!(service.id, Some(1));
    assert_eq!(user.id, Some(1));
    assert_ne!(service.entity_key().unwrap(), user.entity_key().unwrap());
}

#[tokio::test]
async fn test_hash_stable_across_refetches() {
    let db = Database::new(":memory:").await.unwrap();

    let service = db
        .services()
        .insert(&Service::new(ServiceKind::Irc, "s", "s"))
        .await
        .unwrap();

    let first = db
        .services()
        .find_by_id(service.id.unwrap())
        .await
        .unwrap();
    let second = db
        .services()
        .find_by_id(service.id.unwrap())
        .await
        .unwrap();

    assert_eq!(hash_of(&first), hash_of(&second));
    assert_eq!(hash_of(&first), hash_of(&service));
}

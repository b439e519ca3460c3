//! Subtype mapping tests: discriminator round trips, the unknown and
//! inconsistent discriminator failure modes, and atomicity of the two-table
//! write.

use chatlog_store::Database;
use chatlog_store::StoreError;
use chatlog_store::model::{
    Chat, ChatKind, IrcChatExt, IrcUserExt, Service, ServiceKind, User, UserKind,
};

async fn memory_db() -> Database {
    Database::new(":memory:").await.unwrap()
}

async fn seed_service(db: &Database) -> i64 {
    db.services()
        .insert(&Service::new(ServiceKind::Irc, "example", "irc.example.net"))
        .await
        .unwrap()
        .id
        .unwrap()
}

#[tokio::test]
async fn test_irc_user_round_trip_exposes_both_tables() {
    let db = memory_db().await;
    let service_id = seed_service(&db).await;

    let bob = db
        .users()
        .insert(&User::new(
            UserKind::Irc(IrcUserExt {
                ident: "b".into(),
                host: "h".into(),
                real_name: "Bob".into(),
                server: "irc.example.net".into(),
            }),
            service_id,
            "bob",
            "bob",
        ))
        .await
        .unwrap();

    let fetched = db.users().find_by_id(bob.id.unwrap()).await.unwrap();
    assert_eq!(fetched.name, "bob");
    assert_eq!(fetched.kind.discriminator(), "irc_user");
    match fetched.kind {
        UserKind::Irc(ext) => {
            assert_eq!(ext.ident, "b");
            assert_eq!(ext.host, "h");
            assert_eq!(ext.real_name, "Bob");
            assert_eq!(ext.server, "irc.example.net");
        }
        UserKind::Plain => panic!("subtype columns were not attached"),
    }

    // The discriminator landed in the base row and the subtype row shares
    // the primary key.
    let (disc, subtype_id): (String, i64) = sqlx::query_as(
        "SELECT u.user_type, i.id FROM user u JOIN irc_user i ON i.id = u.id WHERE u.id = ?",
    )
    .bind(bob.id.unwrap())
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(disc, "irc_user");
    assert_eq!(subtype_id, bob.id.unwrap());
}

#[tokio::test]
async fn test_plain_and_irc_chats_coexist() {
    let db = memory_db().await;
    let service_id = seed_service(&db).await;

    let plain = db
        .chats()
        .insert(&Chat::new(ChatKind::Plain, service_id, "general", "general"))
        .await
        .unwrap();
    let irc = db
        .chats()
        .insert(&Chat::new(
            ChatKind::Irc(IrcChatExt {
                topic: Some("welcome".into()),
            }),
            service_id,
            "#general",
            "#general",
        ))
        .await
        .unwrap();

    let plain = db.chats().find_by_id(plain.id.unwrap()).await.unwrap();
    assert_eq!(plain.kind.discriminator(), "chat");

    let irc = db.chats().find_by_id(irc.id.unwrap()).await.unwrap();
    match irc.kind {
        ChatKind::Irc(ext) => assert_eq!(ext.topic.as_deref(), Some("welcome")),
        ChatKind::Plain => panic!("subtype columns were not attached"),
    }
}

#[tokio::test]
async fn test_unknown_discriminator_fails_loudly() {
    let db = memory_db().await;
    let service_id = seed_service(&db).await;

    // Plant a row whose discriminator no subtype has registered.
    sqlx::query(
        "INSERT INTO user (user_type, service_id, name, identifier) VALUES ('xmpp_user', ?, 'x', 'x')",
    )
    .bind(service_id)
    .execute(db.pool())
    .await
    .unwrap();

    let planted_id: i64 = sqlx::query_scalar("SELECT id FROM user WHERE name = 'x'")
        .fetch_one(db.pool())
        .await
        .unwrap();

    match db.users().find_by_id(planted_id).await {
        Err(StoreError::UnknownSubtype {
            entity,
            discriminator,
        }) => {
            assert_eq!(entity, "user");
            assert_eq!(discriminator, "xmpp_user");
        }
        other => panic!("expected UnknownSubtype, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_subtype_row_is_integrity_violation() {
    let db = memory_db().await;
    let service_id = seed_service(&db).await;

    // Discriminator promises an irc_user row that does not exist.
    sqlx::query(
        "INSERT INTO user (user_type, service_id, name, identifier) VALUES ('irc_user', ?, 'ghost', 'ghost')",
    )
    .bind(service_id)
    .execute(db.pool())
    .await
    .unwrap();

    let planted_id: i64 = sqlx::query_scalar("SELECT id FROM user WHERE name = 'ghost'")
        .fetch_one(db.pool())
        .await
        .unwrap();

    assert!(matches!(
        db.users().find_by_id(planted_id).await,
        Err(StoreError::Integrity(_))
    ));
}

#[tokio::test]
async fn test_failed_subtype_write_rolls_back_base_row() {
    let db = memory_db().await;

    // Plant an irc_service row at the id the next base insert will take, so
    // the subtype insert collides. Foreign keys go off briefly to allow the
    // orphan, and back on before the write under test.
    sqlx::query("INSERT INTO service (id, service_type, name, identifier) VALUES (1, 'service', 'a', 'a')")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys=OFF")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO irc_service (id) VALUES (2)")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys=ON")
        .execute(db.pool())
        .await
        .unwrap();

    let result = db
        .services()
        .insert(&Service::new(ServiceKind::Irc, "b", "b"))
        .await;
    assert!(matches!(result, Err(StoreError::Constraint(_))));

    // The base row from the failed insert was rolled back with it.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert!(matches!(
        db.services().find_by_id(2).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_marker_subtypes_round_trip() {
    let db = memory_db().await;

    let irc = db
        .services()
        .insert(&Service::new(ServiceKind::Irc, "net", "net"))
        .await
        .unwrap();
    let plain = db
        .services()
        .insert(&Service::new(ServiceKind::Plain, "misc", "misc"))
        .await
        .unwrap();

    assert_eq!(
        db.services()
            .find_by_id(irc.id.unwrap())
            .await
            .unwrap()
            .kind,
        ServiceKind::Irc
    );
    assert_eq!(
        db.services()
            .find_by_id(plain.id.unwrap())
            .await
            .unwrap()
            .kind,
        ServiceKind::Plain
    );

    let all = db.services().list().await.unwrap();
    assert_eq!(all.len(), 2);
}

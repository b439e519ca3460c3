//! chatlog-store: relational chat-log data model and SQLite persistence.
//!
//! The store models a multi-protocol chat-logging/bridging system: services
//! (one per network), users and chats scoped to a service, memberships
//! linking users into chats, plus append-only message and event logs.
//! Protocol-specific columns live in joined subtype tables selected by a
//! per-row discriminator string; IRC is the first registered protocol.
//!
//! ```no_run
//! use chatlog_store::model::{Service, ServiceKind, User, UserKind, IrcUserExt};
//! use chatlog_store::Database;
//!
//! # async fn demo() -> Result<(), chatlog_store::StoreError> {
//! let db = Database::new("chatlog.db").await?;
//!
//! let network = db
//!     .services()
//!     .insert(&Service::new(ServiceKind::Irc, "libera", "irc.libera.chat"))
//!     .await?;
//!
//! let bob = User::new(
//!     UserKind::Irc(IrcUserExt {
//!         ident: "b".into(),
//!         host: "h".into(),
//!         real_name: "Bob".into(),
//!         server: "irc.libera.chat".into(),
//!     }),
//!     network.id.unwrap(),
//!     "bob",
//!     "bob!b@h",
//! );
//! let bob = db.users().insert(&bob).await?;
//! # let _ = bob;
//! # Ok(())
//! # }
//! ```
//!
//! Entities compare by persisted identity, not field values; see
//! [`model::identity`].

pub mod config;
pub mod db;
pub mod error;
pub mod model;

pub use config::{ConfigError, DatabaseConfig, StoreConfig};
pub use db::Database;
pub use error::StoreError;

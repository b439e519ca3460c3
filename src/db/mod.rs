//! Database module for persistent storage.
//!
//! Provides async SQLite access using SQLx for the chat-log entity graph:
//! services, users, chats, memberships, messages, events, and the bot
//! operator list. One repository per entity hangs off the shared [`Database`]
//! handle.

mod bot_users;
mod chat_users;
mod chats;
mod events;
mod messages;
mod services;
mod users;

pub use bot_users::BotUserRepository;
pub use chat_users::ChatUserRepository;
pub use chats::{ChatRepository, ChatWithMembers};
pub use events::EventRepository;
pub use messages::MessageRepository;
pub use services::ServiceRepository;
pub use users::UserRepository;

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new database connection, running migrations if needed.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        Self::connect(path, 5).await
    }

    /// Create a database connection from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Self::connect(&config.path, config.max_connections).await
    }

    async fn connect(path: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = if path == ":memory:" {
            // Use a uniquely named shared-cache memory database per call.
            // `file::memory:` is global-ish and will collide across parallel tests.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:chatlog-store-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true)
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        } else {
            // Create parent directory if it doesn't exist
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            // WAL allows reads while a write is in progress; foreign_keys must
            // be on for every connection or the cascade schema is inert.
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);

            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        info!(path = %path, "Database connected");

        // Run embedded migrations
        Self::run_migrations(&pool).await?;

        // Check database integrity on startup (prevents silent corruption from crashes)
        let integrity_result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&pool)
            .await?;

        if integrity_result != "ok" {
            tracing::error!(
                integrity_check = %integrity_result,
                "Database integrity check FAILED - corruption detected!"
            );
            return Err(StoreError::Integrity(format!(
                "integrity check failed: {integrity_result}"
            )));
        }

        Ok(Self { pool })
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(StoreError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get service repository.
    pub fn services(&self) -> ServiceRepository<'_> {
        ServiceRepository::new(&self.pool)
    }

    /// Get user repository.
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    /// Get chat repository.
    pub fn chats(&self) -> ChatRepository<'_> {
        ChatRepository::new(&self.pool)
    }

    /// Get membership repository.
    pub fn chat_users(&self) -> ChatUserRepository<'_> {
        ChatUserRepository::new(&self.pool)
    }

    /// Get message repository.
    pub fn messages(&self) -> MessageRepository<'_> {
        MessageRepository::new(&self.pool)
    }

    /// Get event repository.
    pub fn events(&self) -> EventRepository<'_> {
        EventRepository::new(&self.pool)
    }

    /// Get bot operator repository.
    pub fn bot_users(&self) -> BotUserRepository<'_> {
        BotUserRepository::new(&self.pool)
    }
}

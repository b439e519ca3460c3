//! Message repository.
//!
//! Messages are append-only log records. The repository stamps `created_at`
//! on insert; there are no updates.

use crate::error::StoreError;
use crate::model::{Message, MessageKind};
use sqlx::SqlitePool;
use tracing::debug;

type MessageRow = (
    i64,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    String,
    i64,
    Option<i64>,
);

fn message_from_row(row: MessageRow) -> Result<Message, StoreError> {
    let (id, discriminator, service_id, chat_id, user_id, message, created_at, irc_row) = row;
    let kind = match discriminator.as_str() {
        MessageKind::BASE => MessageKind::Plain,
        MessageKind::IRC => {
            if irc_row.is_none() {
                return Err(StoreError::Integrity(format!(
                    "message {id} is marked irc_message but has no irc_message row"
                )));
            }
            MessageKind::Irc
        }
        other => {
            return Err(StoreError::UnknownSubtype {
                entity: "message",
                discriminator: other.to_string(),
            });
        }
    };

    Ok(Message {
        id: Some(id),
        kind,
        service_id,
        chat_id,
        user_id,
        message,
        created_at,
    })
}

/// Repository for message log operations.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient message, assigning its id and timestamp.
    ///
    /// Any `created_at` on the transient record is ignored; the row is
    /// stamped with the current time.
    pub async fn insert(&self, message: &Message) -> Result<Message, StoreError> {
        if let Some(id) = message.id {
            return Err(StoreError::Constraint(format!(
                "message already persisted with id {id}"
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO message (message_type, service_id, chat_id, user_id, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.kind.discriminator())
        .bind(message.service_id)
        .bind(message.chat_id)
        .bind(message.user_id)
        .bind(&message.message)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "message insert"))?;

        let id = result.last_insert_rowid();

        if message.kind == MessageKind::Irc {
            sqlx::query("INSERT INTO irc_message (id) VALUES (?)")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "irc_message insert"))?;
        }

        tx.commit().await?;
        debug!(id, service_id = message.service_id, "message logged");

        let mut persisted = message.clone();
        persisted.id = Some(id);
        persisted.created_at = now;
        Ok(persisted)
    }

    /// Fetch a message by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Message, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.message_type, m.service_id, m.chat_id, m.user_id,
                   m.message, m.created_at, i.id
            FROM message m
            LEFT JOIN irc_message i ON i.id = m.id
            WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "message",
            id,
        })?;

        message_from_row(row)
    }

    /// Most recent messages in a chat, newest first.
    pub async fn recent_for_chat(
        &self,
        chat_id: i64,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.message_type, m.service_id, m.chat_id, m.user_id,
                   m.message, m.created_at, i.id
            FROM message m
            LEFT JOIN irc_message i ON i.id = m.id
            WHERE m.chat_id = ?
            ORDER BY m.id DESC
            LIMIT ?
            "#,
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(message_from_row).collect()
    }

    /// Most recent messages across a service, newest first.
    pub async fn recent_for_service(
        &self,
        service_id: i64,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.message_type, m.service_id, m.chat_id, m.user_id,
                   m.message, m.created_at, i.id
            FROM message m
            LEFT JOIN irc_message i ON i.id = m.id
            WHERE m.service_id = ?
            ORDER BY m.id DESC
            LIMIT ?
            "#,
        )
        .bind(service_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(message_from_row).collect()
    }

    /// Delete a message. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM message WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

//! Chat repository.
//!
//! Chats are channels/conversations scoped to one service. Membership lists
//! are wanted alongside a chat often enough that [`ChatRepository::find_with_members`]
//! materializes them eagerly.

use super::chat_users::{ChatUserRow, chat_user_from_row};
use crate::error::StoreError;
use crate::model::{Chat, ChatKind, ChatUser, IrcChatExt};
use sqlx::SqlitePool;
use tracing::debug;

type ChatRow = (i64, String, i64, String, String, Option<i64>, Option<String>);

fn chat_from_row(row: ChatRow) -> Result<Chat, StoreError> {
    let (id, discriminator, service_id, name, identifier, irc_row, topic) = row;
    let kind = match discriminator.as_str() {
        ChatKind::BASE => ChatKind::Plain,
        ChatKind::IRC => {
            if irc_row.is_none() {
                return Err(StoreError::Integrity(format!(
                    "chat {id} is marked irc_chat but has no irc_chat row"
                )));
            }
            ChatKind::Irc(IrcChatExt { topic })
        }
        other => {
            return Err(StoreError::UnknownSubtype {
                entity: "chat",
                discriminator: other.to_string(),
            });
        }
    };

    Ok(Chat {
        id: Some(id),
        kind,
        service_id,
        name,
        identifier,
    })
}

/// A chat with its memberships materialized.
#[derive(Debug, Clone)]
pub struct ChatWithMembers {
    pub chat: Chat,
    pub members: Vec<ChatUser>,
}

/// Repository for chat operations.
pub struct ChatRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient chat, assigning its id.
    ///
    /// IRC chats write the base row and the `irc_chat` row in one
    /// transaction; if either insert fails, neither is committed.
    pub async fn insert(&self, chat: &Chat) -> Result<Chat, StoreError> {
        if let Some(id) = chat.id {
            return Err(StoreError::Constraint(format!(
                "chat already persisted with id {id}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO chat (chat_type, service_id, name, identifier)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(chat.kind.discriminator())
        .bind(chat.service_id)
        .bind(&chat.name)
        .bind(&chat.identifier)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "chat insert"))?;

        let id = result.last_insert_rowid();

        if let ChatKind::Irc(ext) = &chat.kind {
            sqlx::query("INSERT INTO irc_chat (id, topic) VALUES (?, ?)")
                .bind(id)
                .bind(&ext.topic)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "irc_chat insert"))?;
        }

        tx.commit().await?;
        debug!(id, name = %chat.name, kind = chat.kind.discriminator(), "chat persisted");

        let mut persisted = chat.clone();
        persisted.id = Some(id);
        Ok(persisted)
    }

    /// Fetch a chat by id, joining the subtype table per its discriminator.
    pub async fn find_by_id(&self, id: i64) -> Result<Chat, StoreError> {
        let row = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT c.id, c.chat_type, c.service_id, c.name, c.identifier, i.id, i.topic
            FROM chat c
            LEFT JOIN irc_chat i ON i.id = c.id
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::NotFound { entity: "chat", id })?;

        chat_from_row(row)
    }

    /// Fetch a chat together with its membership list.
    pub async fn find_with_members(&self, id: i64) -> Result<ChatWithMembers, StoreError> {
        let chat = self.find_by_id(id).await?;

        let rows = sqlx::query_as::<_, ChatUserRow>(
            r#"
            SELECT cu.id, cu.chat_user_type, cu.chat_id, cu.user_id, cu.active,
                   i.operator, i.voiced
            FROM chat_user cu
            LEFT JOIN irc_chat_user i ON i.id = cu.id
            WHERE cu.chat_id = ?
            ORDER BY cu.id
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let members = rows
            .into_iter()
            .map(chat_user_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChatWithMembers { chat, members })
    }

    /// Find a chat by external identifier within one service.
    pub async fn find_by_identifier(
        &self,
        service_id: i64,
        identifier: &str,
    ) -> Result<Option<Chat>, StoreError> {
        let rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT c.id, c.chat_type, c.service_id, c.name, c.identifier, i.id, i.topic
            FROM chat c
            LEFT JOIN irc_chat i ON i.id = c.id
            WHERE c.service_id = ? AND c.identifier = ?
            "#,
        )
        .bind(service_id)
        .bind(identifier)
        .fetch_all(self.pool)
        .await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(chat_from_row(rows.into_iter().next().unwrap())?)),
            n => Err(StoreError::Integrity(format!(
                "{n} chats in service {service_id} share identifier {identifier:?}"
            ))),
        }
    }

    /// List the chats belonging to a service.
    pub async fn for_service(&self, service_id: i64) -> Result<Vec<Chat>, StoreError> {
        let rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT c.id, c.chat_type, c.service_id, c.name, c.identifier, i.id, i.topic
            FROM chat c
            LEFT JOIN irc_chat i ON i.id = c.id
            WHERE c.service_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(service_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(chat_from_row).collect()
    }

    /// Update the topic on an IRC chat.
    ///
    /// Fails with [`StoreError::Constraint`] when the chat is not an
    /// `irc_chat` (topics are an IRC-only column).
    pub async fn set_topic(&self, id: i64, topic: Option<&str>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE irc_chat SET topic = ? WHERE id = ?")
            .bind(topic)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Constraint(format!(
                "chat {id} is not an irc_chat"
            )));
        }
        Ok(())
    }

    /// Rename a chat.
    pub async fn set_name(&self, id: i64, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE chat SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "chat", id });
        }
        Ok(())
    }

    /// Delete a chat. Cascades to its memberships; message and event
    /// references are nulled, not removed. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM chat WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!(id, "chat deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}

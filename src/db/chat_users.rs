//! Membership repository.
//!
//! A `chat_user` row links one user to one chat and carries membership state
//! of its own (presence, and for IRC the +o/+v flags). The (chat, user) pair
//! is unique; duplicates surface as [`StoreError::Constraint`].

use crate::error::StoreError;
use crate::model::{ChatUser, ChatUserKind, IrcChatUserExt};
use sqlx::SqlitePool;
use tracing::debug;

pub(super) type ChatUserRow = (
    i64,
    String,
    i64,
    i64,
    bool,
    Option<bool>,
    Option<bool>,
);

pub(super) fn chat_user_from_row(row: ChatUserRow) -> Result<ChatUser, StoreError> {
    let (id, discriminator, chat_id, user_id, active, operator, voiced) = row;
    let kind = match discriminator.as_str() {
        ChatUserKind::BASE => ChatUserKind::Plain,
        ChatUserKind::IRC => match (operator, voiced) {
            (Some(operator), Some(voiced)) => {
                ChatUserKind::Irc(IrcChatUserExt { operator, voiced })
            }
            _ => {
                return Err(StoreError::Integrity(format!(
                    "chat_user {id} is marked irc_chat_user but has no irc_chat_user row"
                )));
            }
        },
        other => {
            return Err(StoreError::UnknownSubtype {
                entity: "chat_user",
                discriminator: other.to_string(),
            });
        }
    };

    Ok(ChatUser {
        id: Some(id),
        kind,
        chat_id,
        user_id,
        active,
    })
}

/// Repository for membership operations.
pub struct ChatUserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChatUserRepository<'a> {
    /// Create a new membership repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient membership, assigning its id.
    ///
    /// Fails with [`StoreError::Constraint`] when the referenced chat or
    /// user does not exist, or when the (chat, user) pair already has a
    /// membership; nothing is committed in either case.
    pub async fn insert(&self, membership: &ChatUser) -> Result<ChatUser, StoreError> {
        if let Some(id) = membership.id {
            return Err(StoreError::Constraint(format!(
                "chat_user already persisted with id {id}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO chat_user (chat_user_type, chat_id, user_id, active)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(membership.kind.discriminator())
        .bind(membership.chat_id)
        .bind(membership.user_id)
        .bind(membership.active)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "chat_user insert"))?;

        let id = result.last_insert_rowid();

        if let ChatUserKind::Irc(ext) = &membership.kind {
            sqlx::query(
                r#"
                INSERT INTO irc_chat_user (id, operator, voiced)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(ext.operator)
            .bind(ext.voiced)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "irc_chat_user insert"))?;
        }

        tx.commit().await?;
        debug!(
            id,
            chat_id = membership.chat_id,
            user_id = membership.user_id,
            "membership persisted"
        );

        let mut persisted = membership.clone();
        persisted.id = Some(id);
        Ok(persisted)
    }

    /// Fetch a membership by id.
    pub async fn find_by_id(&self, id: i64) -> Result<ChatUser, StoreError> {
        let row = sqlx::query_as::<_, ChatUserRow>(
            r#"
            SELECT cu.id, cu.chat_user_type, cu.chat_id, cu.user_id, cu.active,
                   i.operator, i.voiced
            FROM chat_user cu
            LEFT JOIN irc_chat_user i ON i.id = cu.id
            WHERE cu.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "chat_user",
            id,
        })?;

        chat_user_from_row(row)
    }

    /// List a chat's memberships.
    pub async fn for_chat(&self, chat_id: i64) -> Result<Vec<ChatUser>, StoreError> {
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
        .bind(chat_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(chat_user_from_row).collect()
    }

    /// List a user's memberships across chats.
    pub async fn for_user(&self, user_id: i64) -> Result<Vec<ChatUser>, StoreError> {
        let rows = sqlx::query_as::<_, ChatUserRow>(
            r#"
            SELECT cu.id, cu.chat_user_type, cu.chat_id, cu.user_id, cu.active,
                   i.operator, i.voiced
            FROM chat_user cu
            LEFT JOIN irc_chat_user i ON i.id = cu.id
            WHERE cu.user_id = ?
            ORDER BY cu.id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(chat_user_from_row).collect()
    }

    /// Find the membership for a (chat, user) pair, if any.
    pub async fn find_pair(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<Option<ChatUser>, StoreError> {
        let row = sqlx::query_as::<_, ChatUserRow>(
            r#"
            SELECT cu.id, cu.chat_user_type, cu.chat_id, cu.user_id, cu.active,
                   i.operator, i.voiced
            FROM chat_user cu
            LEFT JOIN irc_chat_user i ON i.id = cu.id
            WHERE cu.chat_id = ? AND cu.user_id = ?
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(chat_user_from_row).transpose()
    }

    /// Mark a membership present or absent (join/part).
    pub async fn set_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE chat_user SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "chat_user",
                id,
            });
        }
        Ok(())
    }

    /// Update the IRC operator/voiced flags on a membership.
    ///
    /// Fails with [`StoreError::Constraint`] when the membership is not an
    /// `irc_chat_user` (a discriminator rule, not a missing row).
    pub async fn set_flags(&self, id: i64, operator: bool, voiced: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE irc_chat_user SET operator = ?, voiced = ? WHERE id = ?")
            .bind(operator)
            .bind(voiced)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Constraint(format!(
                "chat_user {id} is not an irc_chat_user"
            )));
        }
        Ok(())
    }

    /// Delete a membership. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM chat_user WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

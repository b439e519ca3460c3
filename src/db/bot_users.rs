//! Bot operator repository.
//!
//! Bot users are the administrative allow-list: names authorized to drive
//! the bot. Standalone table, no subtypes, no foreign keys.

use crate::error::StoreError;
use crate::model::BotUser;
use sqlx::SqlitePool;
use tracing::debug;

/// Repository for bot operator operations.
pub struct BotUserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BotUserRepository<'a> {
    /// Create a new bot operator repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient bot user, assigning its id.
    ///
    /// Names are unique; a duplicate fails with [`StoreError::Constraint`].
    pub async fn insert(&self, bot_user: &BotUser) -> Result<BotUser, StoreError> {
        if let Some(id) = bot_user.id {
            return Err(StoreError::Constraint(format!(
                "bot_user already persisted with id {id}"
            )));
        }

        let result = sqlx::query("INSERT INTO bot_user (name) VALUES (?)")
            .bind(&bot_user.name)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, "bot_user insert"))?;

        let id = result.last_insert_rowid();
        debug!(id, name = %bot_user.name, "bot user persisted");

        let mut persisted = bot_user.clone();
        persisted.id = Some(id);
        Ok(persisted)
    }

    /// Fetch a bot user by id.
    pub async fn find_by_id(&self, id: i64) -> Result<BotUser, StoreError> {
        let row = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM bot_user WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "bot_user",
                id,
            })?;

        Ok(BotUser {
            id: Some(row.0),
            name: row.1,
        })
    }

    /// Find a bot user by name.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<BotUser>, StoreError> {
        let row = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM bot_user WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|(id, name)| BotUser {
            id: Some(id),
            name,
        }))
    }

    /// List all bot users.
    pub async fn list(&self) -> Result<Vec<BotUser>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM bot_user ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| BotUser {
                id: Some(id),
                name,
            })
            .collect())
    }

    /// Delete a bot user. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bot_user WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

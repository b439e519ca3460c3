//! User repository.
//!
//! Users are participants scoped to one service. The `irc_user` subtype adds
//! the usual nick!ident@host details plus real name and server.

use crate::error::StoreError;
use crate::model::{IrcUserExt, User, UserKind};
use sqlx::SqlitePool;
use tracing::debug;

type UserRow = (
    i64,
    String,
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn user_from_row(row: UserRow) -> Result<User, StoreError> {
    let (id, discriminator, service_id, name, identifier, ident, host, real_name, server) = row;
    let kind = match discriminator.as_str() {
        UserKind::BASE => UserKind::Plain,
        UserKind::IRC => match (ident, host, real_name, server) {
            (Some(ident), Some(host), Some(real_name), Some(server)) => UserKind::Irc(IrcUserExt {
                ident,
                host,
                real_name,
                server,
            }),
            _ => {
                return Err(StoreError::Integrity(format!(
                    "user {id} is marked irc_user but has no irc_user row"
                )));
            }
        },
        other => {
            return Err(StoreError::UnknownSubtype {
                entity: "user",
                discriminator: other.to_string(),
            });
        }
    };

    Ok(User {
        id: Some(id),
        kind,
        service_id,
        name,
        identifier,
    })
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient user, assigning its id.
    ///
    /// IRC users write the base row and the `irc_user` row in one
    /// transaction; if either insert fails, neither is committed. A missing
    /// service reference surfaces as [`StoreError::Constraint`].
    pub async fn insert(&self, user: &User) -> Result<User, StoreError> {
        if let Some(id) = user.id {
            return Err(StoreError::Constraint(format!(
                "user already persisted with id {id}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO user (user_type, service_id, name, identifier)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user.kind.discriminator())
        .bind(user.service_id)
        .bind(&user.name)
        .bind(&user.identifier)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "user insert"))?;

        let id = result.last_insert_rowid();

        if let UserKind::Irc(ext) = &user.kind {
            sqlx::query(
                r#"
                INSERT INTO irc_user (id, ident, host, real_name, server)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(&ext.ident)
            .bind(&ext.host)
            .bind(&ext.real_name)
            .bind(&ext.server)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "irc_user insert"))?;
        }

        tx.commit().await?;
        debug!(id, name = %user.name, kind = user.kind.discriminator(), "user persisted");

        let mut persisted = user.clone();
        persisted.id = Some(id);
        Ok(persisted)
    }

    /// Fetch a user by id, joining the subtype table per its discriminator.
    pub async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.user_type, u.service_id, u.name, u.identifier,
                   i.ident, i.host, i.real_name, i.server
            FROM user u
            LEFT JOIN irc_user i ON i.id = u.id
            WHERE u.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::NotFound { entity: "user", id })?;

        user_from_row(row)
    }

    /// Find a user by external identifier within one service.
    pub async fn find_by_identifier(
        &self,
        service_id: i64,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.user_type, u.service_id, u.name, u.identifier,
                   i.ident, i.host, i.real_name, i.server
            FROM user u
            LEFT JOIN irc_user i ON i.id = u.id
            WHERE u.service_id = ? AND u.identifier = ?
            "#,
        )
        .bind(service_id)
        .bind(identifier)
        .fetch_all(self.pool)
        .await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(user_from_row(rows.into_iter().next().unwrap())?)),
            n => Err(StoreError::Integrity(format!(
                "{n} users in service {service_id} share identifier {identifier:?}"
            ))),
        }
    }

    /// List the users belonging to a service.
    pub async fn for_service(&self, service_id: i64) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.user_type, u.service_id, u.name, u.identifier,
                   i.ident, i.host, i.real_name, i.server
            FROM user u
            LEFT JOIN irc_user i ON i.id = u.id
            WHERE u.service_id = ?
            ORDER BY u.id
            "#,
        )
        .bind(service_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(user_from_row).collect()
    }

    /// Rename a user (e.g. after a nick change).
    pub async fn set_name(&self, id: i64, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE user SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "user", id });
        }
        Ok(())
    }

    /// Delete a user. Cascades to the user's memberships; message and event
    /// references are nulled, not removed. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!(id, "user deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}

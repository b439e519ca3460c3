//! Service repository.
//!
//! A service is one platform/network instance (e.g. one IRC network); every
//! user and chat hangs off exactly one service. Deleting a service cascades
//! to everything it owns.

use crate::error::StoreError;
use crate::model::{Service, ServiceKind};
use sqlx::SqlitePool;
use tracing::debug;

type ServiceRow = (i64, String, String, String, Option<i64>);

fn service_from_row(row: ServiceRow) -> Result<Service, StoreError> {
    let (id, discriminator, name, identifier, irc_row) = row;
    let kind = match discriminator.as_str() {
        ServiceKind::BASE => ServiceKind::Plain,
        ServiceKind::IRC => {
            if irc_row.is_none() {
                return Err(StoreError::Integrity(format!(
                    "service {id} is marked irc_service but has no irc_service row"
                )));
            }
            ServiceKind::Irc
        }
        other => {
            return Err(StoreError::UnknownSubtype {
                entity: "service",
                discriminator: other.to_string(),
            });
        }
    };

    Ok(Service {
        id: Some(id),
        kind,
        name,
        identifier,
    })
}

/// Repository for service operations.
pub struct ServiceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new service repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient service, assigning its id.
    ///
    /// IRC services write the base row and the subtype marker row in one
    /// transaction; if either insert fails, neither is committed.
    pub async fn insert(&self, service: &Service) -> Result<Service, StoreError> {
        if let Some(id) = service.id {
            return Err(StoreError::Constraint(format!(
                "service already persisted with id {id}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO service (service_type, name, identifier)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(service.kind.discriminator())
        .bind(&service.name)
        .bind(&service.identifier)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "service insert"))?;

        let id = result.last_insert_rowid();

        if service.kind == ServiceKind::Irc {
            sqlx::query("INSERT INTO irc_service (id) VALUES (?)")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "irc_service insert"))?;
        }

        tx.commit().await?;
        debug!(id, name = %service.name, kind = service.kind.discriminator(), "service persisted");

        let mut persisted = service.clone();
        persisted.id = Some(id);
        Ok(persisted)
    }

    /// Fetch a service by id, joining the subtype table per its discriminator.
    pub async fn find_by_id(&self, id: i64) -> Result<Service, StoreError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT s.id, s.service_type, s.name, s.identifier, i.id
            FROM service s
            LEFT JOIN irc_service i ON i.id = s.id
            WHERE s.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "service",
            id,
        })?;

        service_from_row(row)
    }

    /// Find a service by its external identifier.
    ///
    /// Identifiers are not declared unique; more than one match is reported
    /// as an integrity violation rather than picking a row arbitrarily.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Service>, StoreError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT s.id, s.service_type, s.name, s.identifier, i.id
            FROM service s
            LEFT JOIN irc_service i ON i.id = s.id
            WHERE s.identifier = ?
            "#,
        )
        .bind(identifier)
        .fetch_all(self.pool)
        .await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(service_from_row(rows.into_iter().next().unwrap())?)),
            n => Err(StoreError::Integrity(format!(
                "{n} services share identifier {identifier:?}"
            ))),
        }
    }

    /// List all services.
    pub async fn list(&self) -> Result<Vec<Service>, StoreError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT s.id, s.service_type, s.name, s.identifier, i.id
            FROM service s
            LEFT JOIN irc_service i ON i.id = s.id
            ORDER BY s.id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(service_from_row).collect()
    }

    /// Delete a service.
    ///
    /// Cascades to the service's users, chats, messages, and events, and
    /// transitively to memberships. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM service WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!(id, "service deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}

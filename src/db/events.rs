//! Event repository.
//!
//! Events log state changes around the network: nick changes, topic changes,
//! joins and parts. `event` names what happened, `old_value`/`new_value`
//! carry the mutation. Append-only, stamped on insert like messages.

use crate::error::StoreError;
use crate::model::{Event, EventKind};
use sqlx::SqlitePool;
use tracing::debug;

type EventRow = (
    i64,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    String,
    Option<String>,
    Option<String>,
    i64,
    Option<i64>,
);

fn event_from_row(row: EventRow) -> Result<Event, StoreError> {
    let (id, discriminator, service_id, chat_id, user_id, event, new_value, old_value, created_at, irc_row) =
        row;
    let kind = match discriminator.as_str() {
        EventKind::BASE => EventKind::Plain,
        EventKind::IRC => {
            if irc_row.is_none() {
                return Err(StoreError::Integrity(format!(
                    "event {id} is marked irc_event but has no irc_event row"
                )));
            }
            EventKind::Irc
        }
        other => {
            return Err(StoreError::UnknownSubtype {
                entity: "event",
                discriminator: other.to_string(),
            });
        }
    };

    Ok(Event {
        id: Some(id),
        kind,
        service_id,
        chat_id,
        user_id,
        event,
        new_value,
        old_value,
        created_at,
    })
}

/// Repository for event log operations.
pub struct EventRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventRepository<'a> {
    /// Create a new event repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a transient event, assigning its id and timestamp.
    pub async fn insert(&self, event: &Event) -> Result<Event, StoreError> {
        if let Some(id) = event.id {
            return Err(StoreError::Constraint(format!(
                "event already persisted with id {id}"
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO event (event_type, service_id, chat_id, user_id, event, new_value, old_value, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.kind.discriminator())
        .bind(event.service_id)
        .bind(event.chat_id)
        .bind(event.user_id)
        .bind(&event.event)
        .bind(&event.new_value)
        .bind(&event.old_value)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "event insert"))?;

        let id = result.last_insert_rowid();

        if event.kind == EventKind::Irc {
            sqlx::query("INSERT INTO irc_event (id) VALUES (?)")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "irc_event insert"))?;
        }

        tx.commit().await?;
        debug!(id, service_id = event.service_id, kind = %event.event, "event logged");

        let mut persisted = event.clone();
        persisted.id = Some(id);
        persisted.created_at = now;
        Ok(persisted)
    }

    /// Fetch an event by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Event, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT e.id, e.event_type, e.service_id, e.chat_id, e.user_id,
                   e.event, e.new_value, e.old_value, e.created_at, i.id
            FROM event e
            LEFT JOIN irc_event i ON i.id = e.id
            WHERE e.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::NotFound { entity: "event", id })?;

        event_from_row(row)
    }

    /// Most recent events in a chat, newest first.
    pub async fn recent_for_chat(&self, chat_id: i64, limit: i64) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT e.id, e.event_type, e.service_id, e.chat_id, e.user_id,
                   e.event, e.new_value, e.old_value, e.created_at, i.id
            FROM event e
            LEFT JOIN irc_event i ON i.id = e.id
            WHERE e.chat_id = ?
            ORDER BY e.id DESC
            LIMIT ?
            "#,
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(event_from_row).collect()
    }

    /// Most recent events across a service, newest first.
    pub async fn recent_for_service(
        &self,
        service_id: i64,
        limit: i64,
    ) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT e.id, e.event_type, e.service_id, e.chat_id, e.user_id,
                   e.event, e.new_value, e.old_value, e.created_at, i.id
            FROM event e
            LEFT JOIN irc_event i ON i.id = e.id
            WHERE e.service_id = ?
            ORDER BY e.id DESC
            LIMIT ?
            "#,
        )
        .bind(service_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(event_from_row).collect()
    }

    /// Delete an event. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM event WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

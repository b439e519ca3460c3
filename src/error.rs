//! Unified error handling for the store.
//!
//! Every failure the persistence layer can produce surfaces as a
//! [`StoreError`] variant; nothing is swallowed internally. Callers decide
//! retry policy, this layer only reports.

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row exists for the requested id.
    #[error("no {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A broken invariant was detected on read, e.g. a base row whose
    /// discriminator promises a subtype row that does not exist.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A write violated a foreign key, uniqueness, or discriminator rule.
    /// The offending write is rolled back in full.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A stored discriminator value has no registered subtype.
    #[error("unknown {entity} subtype: {discriminator:?}")]
    UnknownSubtype {
        entity: &'static str,
        discriminator: String,
    },

    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Map an sqlx write error, converting foreign key and uniqueness
    /// violations reported by SQLite into [`StoreError::Constraint`].
    pub(crate) fn from_write(err: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_foreign_key_violation() || db_err.is_unique_violation())
        {
            return StoreError::Constraint(format!("{context}: {db_err}"));
        }
        StoreError::from(err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err)
    }
}

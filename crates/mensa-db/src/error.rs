//! Database-specific error types and conversions.

use mensa_core::error::MensaError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with key {key}")]
    NotFound { entity: String, key: String },

    #[error("Unique index violated: {entity}")]
    Conflict { entity: String },
}

impl From<DbError> for MensaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, key } => MensaError::NotFound { entity, key },
            DbError::Conflict { entity } => MensaError::AlreadyExists { entity },
            other => MensaError::Database(other.to_string()),
        }
    }
}

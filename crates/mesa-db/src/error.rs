//! Database-specific error types and conversions.

use mesa_core::error::MesaError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conditional update lost: {0}")]
    Conflict(String),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),
}

impl From<DbError> for MesaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MesaError::NotFound { entity, id },
            DbError::Conflict(msg) => MesaError::Conflict(msg),
            other => MesaError::Database(other.to_string()),
        }
    }
}

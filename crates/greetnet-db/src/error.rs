//! Database-specific error types and conversions.

use greetnet_core::error::GreetnetError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Map a write error, turning unique-index violations into
    /// `AlreadyExists` so the service layer can surface them as field
    /// errors.
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> DbError {
        let msg = err.to_string();
        if msg.contains("already contains") || msg.contains("unique") {
            DbError::AlreadyExists {
                entity: entity.to_string(),
            }
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for GreetnetError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GreetnetError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => GreetnetError::AlreadyExists { entity },
            other => GreetnetError::Database(other.to_string()),
        }
    }
}

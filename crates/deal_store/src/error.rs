//! Deal store error types.

use thiserror::Error;

/// Errors that can occur during deal store operations.
#[derive(Debug, Error)]
pub enum DealStoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Duplicate entity.
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Foreign key constraint violation.
    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyViolation(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl DealStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }

    /// Classifies a failed insert, surfacing constraint violations as
    /// domain errors instead of raw database errors.
    pub(crate) fn from_insert(entity_type: &'static str, id: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::already_exists(entity_type, id);
            }
            if db.is_foreign_key_violation() {
                return Self::ForeignKeyViolation(db.message().to_string());
            }
        }
        Self::Database(err)
    }
}

/// Result type for deal store operations.
pub type StoreResult<T> = Result<T, DealStoreError>;

//! Store errors.

use lexdesk_core::{EntityKind, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },

    /// A foreign key points at a row that does not exist.
    #[error("{column} references missing {target} '{id}'")]
    ForeignKey {
        column: String,
        target: EntityKind,
        id: String,
    },

    /// The row is still referenced by another table.
    #[error("{entity} '{id}' is still referenced by {referenced_by}")]
    InUse {
        entity: EntityKind,
        id: String,
        referenced_by: String,
    },

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Foreign key and uniqueness failures, reported to clients as conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ForeignKey { .. } | Self::InUse { .. } | Self::Conflict(_)
        )
    }
}

//! Store error types.

use crate::domain::GroupingKey;

/// Errors that can occur when reading or writing persisted entities.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No entity with this id exists
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Another `created` trip already has this grouping key
    #[error("an open trip already exists for {0}")]
    DuplicateOpenTrip(GroupingKey),

    /// Reading or writing a snapshot failed
    #[error("snapshot error: {message}")]
    Snapshot { message: String },
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

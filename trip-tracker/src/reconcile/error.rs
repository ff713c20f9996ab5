//! Reconciliation error types.

use crate::domain::DomainError;
use crate::locations::LocationError;
use crate::store::StoreError;

/// Coarse classification of a [`ReconcileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The entity does not exist
    NotFound,
    /// The operation is not allowed in the entity's current state
    InvalidState,
    /// The caller may not act on this entity
    AccessDenied,
    /// The request itself is malformed or incomplete
    InvalidArgument,
    /// The operation would create a duplicate
    Conflict,
}

/// Errors returned by the reconciliation and lifecycle operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReconcileError {
    /// No entity with this key exists
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// Not allowed in the current lifecycle state
    #[error("{0}")]
    InvalidState(String),

    /// Caller does not own the entity
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Missing or malformed input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Double booking or duplicate trip
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ReconcileError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ReconcileError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        ReconcileError::InvalidState(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::NotFound { .. } => ErrorKind::NotFound,
            ReconcileError::InvalidState(_) => ErrorKind::InvalidState,
            ReconcileError::AccessDenied(_) => ErrorKind::AccessDenied,
            ReconcileError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ReconcileError::Conflict(_) => ErrorKind::Conflict,
            ReconcileError::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            ReconcileError::Store(StoreError::DuplicateOpenTrip(_)) => ErrorKind::Conflict,
            ReconcileError::Store(StoreError::Snapshot { .. }) => ErrorKind::InvalidState,
            ReconcileError::Location(_) => ErrorKind::InvalidArgument,
            ReconcileError::Domain(DomainError::InvalidTransition { .. }) => ErrorKind::InvalidState,
            ReconcileError::Domain(DomainError::MissingField(_)) => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TripId, TripStatus};

    #[test]
    fn kinds_of_wrapped_errors() {
        let err: ReconcileError = StoreError::not_found("trip", TripId(1)).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "trip trip#1 not found");

        let err: ReconcileError = DomainError::InvalidTransition {
            from: TripStatus::Completed,
            to: TripStatus::Cancelled,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: ReconcileError = DomainError::MissingField("ship").into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err: ReconcileError = LocationError::EmptyName.into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn direct_variants() {
        assert_eq!(ReconcileError::not_found("passenger", "Alice Smith").kind(), ErrorKind::NotFound);
        assert_eq!(ReconcileError::invalid_state("nope").kind(), ErrorKind::InvalidState);
        assert_eq!(ReconcileError::AccessDenied("x".into()).kind(), ErrorKind::AccessDenied);
        assert_eq!(ReconcileError::Conflict("x".into()).kind(), ErrorKind::Conflict);
    }
}

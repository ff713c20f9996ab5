//! Domain error types.
//!
//! These errors represent invalid state changes and incomplete records in
//! the domain layer. They are distinct from storage and lookup errors.

use super::TripStatus;

/// Domain-level errors for validation and lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The trip lifecycle does not allow this status change
    #[error("cannot move trip from {from} to {to}")]
    InvalidTransition { from: TripStatus, to: TripStatus },

    /// A field needed for the operation is missing
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidTransition {
            from: TripStatus::Completed,
            to: TripStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "cannot move trip from completed to cancelled");

        let err = DomainError::MissingField("pickup time");
        assert_eq!(err.to_string(), "missing required field: pickup time");
    }
}

//! Ingestion and lifecycle status types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value:?}")]
pub struct InvalidStatus {
    kind: &'static str,
    value: String,
}

/// What a manifest row asks the reconciliation to do with a passenger.
///
/// Only meaningful while a batch is being reconciled; it is never the
/// lifecycle status of a committed passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    /// A new booking.
    #[default]
    Add,
    /// A change to the time or route of an existing booking.
    Change,
    /// A cancellation of an existing booking.
    Cancel,
}

impl IngestionStatus {
    /// Returns the manifest spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Add => "add",
            IngestionStatus::Change => "change",
            IngestionStatus::Cancel => "cancel",
        }
    }

    /// Parse the manifest spelling of a status.
    pub fn parse(s: &str) -> Result<Self, InvalidStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(IngestionStatus::Add),
            "change" => Ok(IngestionStatus::Change),
            "cancel" => Ok(IngestionStatus::Cancel),
            _ => Err(InvalidStatus {
                kind: "ingestion",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a trip, and of each committed passenger on it.
///
/// ```text
/// created -> assigned -> in_progress -> completed
///    |          |
///    +----------+--> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Accepting passengers, no driver yet.
    #[default]
    Created,
    /// A driver has been assigned.
    Assigned,
    /// The vehicle is on its way.
    InProgress,
    /// The run is finished.
    Completed,
    /// Cancelled before it started.
    Cancelled,
}

impl TripStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [TripStatus; 5] = [
        TripStatus::Created,
        TripStatus::Assigned,
        TripStatus::InProgress,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    /// Returns the persisted spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Created => "created",
            TripStatus::Assigned => "assigned",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status, accepting the legacy spellings `cancel`/`canceled`
    /// and `in-progress`.
    pub fn parse(s: &str) -> Result<Self, InvalidStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(TripStatus::Created),
            "assigned" => Ok(TripStatus::Assigned),
            "in_progress" | "in-progress" => Ok(TripStatus::InProgress),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" | "canceled" | "cancel" => Ok(TripStatus::Cancelled),
            _ => Err(InvalidStatus {
                kind: "trip",
                value: s.to_string(),
            }),
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        use TripStatus::*;
        matches!(
            (self, next),
            (Created, Assigned)
                | (Assigned, InProgress)
                | (InProgress, Completed)
                | (Created, Cancelled)
                | (Assigned, Cancelled)
        )
    }

    /// Whether a trip in this status may still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, TripStatus::Created | TripStatus::Assigned)
    }

    /// Whether the vehicle has already left (in progress or completed).
    pub fn has_started(&self) -> bool {
        matches!(self, TripStatus::InProgress | TripStatus::Completed)
    }

    /// Whether the status is `cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TripStatus::Cancelled)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

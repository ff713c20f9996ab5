//! Surrogate identifiers for persisted entities.
//!
//! Every entity is keyed by its own id type so a trip id can never be
//! passed where a passenger id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric id.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a [`Trip`](super::Trip).
    TripId,
    "trip#"
);
entity_id!(
    /// Identifies a committed [`Passenger`](super::Passenger).
    PassengerId,
    "pax#"
);
entity_id!(
    /// Identifies an [`OrganizerCompany`](super::OrganizerCompany).
    CompanyId,
    "company#"
);
entity_id!(
    /// Identifies a [`Ship`](super::Ship).
    ShipId,
    "ship#"
);
entity_id!(
    /// Identifies a canonical [`Location`](super::Location).
    LocationId,
    "location#"
);
entity_id!(
    /// Identifies a dispatch [`Region`](super::Region).
    RegionId,
    "region#"
);
entity_id!(
    /// Identifies a generated report artifact.
    ReportId,
    "report#"
);

/// Opaque driver identifier handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub String);

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_entity_prefix() {
        assert_eq!(TripId(7).to_string(), "trip#7");
        assert_eq!(PassengerId(12).to_string(), "pax#12");
        assert_eq!(format!("{:?}", ShipId(3)), "ShipId(3)");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&TripId(42)).unwrap();
        assert_eq!(json, "42");
        let back: TripId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TripId(42));
    }
}

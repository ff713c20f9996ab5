//! Organizer companies and their ships.

use serde::{Deserialize, Serialize};

use super::{CompanyId, ShipId};

/// The business on whose behalf passengers are booked.
///
/// Scopes trip ownership: a trip belongs to exactly one organizer company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerCompany {
    pub id: Option<CompanyId>,
    pub name: String,
}

impl OrganizerCompany {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// A vessel whose crew or guests are transported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: Option<ShipId>,
    pub name: String,
    /// IMO number, when known.
    pub imo: Option<u64>,
    /// The organizer company that books transport for this ship.
    pub organizer_company: CompanyId,
}

impl Ship {
    pub fn new(name: impl Into<String>, organizer_company: CompanyId) -> Self {
        Self {
            id: None,
            name: name.into(),
            imo: None,
            organizer_company,
        }
    }
}

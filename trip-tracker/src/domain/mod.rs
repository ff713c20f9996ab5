//! Domain types for passenger transport reconciliation.
//!
//! This module contains the bookings, trips and reference data that the
//! reconciliation core works on. Statuses are closed enums and ids are
//! typed per entity, so an illegal status or a mixed-up id does not compile.

mod company;
mod error;
mod ids;
mod location;
mod passenger;
mod status;
mod time;
mod trip;

pub use company::{OrganizerCompany, Ship};
pub use error::DomainError;
pub use ids::{CompanyId, DriverId, LocationId, PassengerId, RegionId, ReportId, ShipId, TripId};
pub use location::{Coordinates, Location, Region, normalize_place};
pub use passenger::{Passenger, ReportRefs};
pub use status::{IngestionStatus, InvalidStatus, TripStatus};
pub use time::{PickupTime, TimeError};
pub use trip::{CANCELLATION_FEE_REMARK, GroupingKey, Itinerary, ReportFlags, Trip};

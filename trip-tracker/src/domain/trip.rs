//! Trips: shared vehicle runs.
//!
//! A trip carries every passenger whose [`GroupingKey`] matches its own.
//! Passengers reference their trip by id; the trip does not hold them, so a
//! trip's roster is always read from the store.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{
    CompanyId, DomainError, DriverId, Location, Passenger, PickupTime, RegionId, ShipId, TripId,
    TripStatus, normalize_place,
};

/// Driver remark appended when a cancellation is billable.
pub const CANCELLATION_FEE_REMARK: &str = "Cancellation fee";

/// The route and commercial terms of a booking, without the company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Itinerary {
    pub ship: ShipId,
    pub po_number: Option<u64>,
    pub pickup_time: PickupTime,
    /// Normalised pickup place name.
    pub pickup_location: String,
    /// Normalised destination place name.
    pub destination: String,
}

/// The tuple that decides whether two passengers share a trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupingKey {
    pub organizer_company: CompanyId,
    pub ship: ShipId,
    pub po_number: Option<u64>,
    pub pickup_time: PickupTime,
    pub destination: String,
    pub pickup_location: String,
}

impl GroupingKey {
    /// The key a booking with `itinerary` would have for `organizer_company`.
    pub fn new(organizer_company: CompanyId, itinerary: &Itinerary) -> Self {
        Self {
            organizer_company,
            ship: itinerary.ship,
            po_number: itinerary.po_number,
            pickup_time: itinerary.pickup_time,
            destination: normalize_place(&itinerary.destination),
            pickup_location: normalize_place(&itinerary.pickup_location),
        }
    }
}

impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} po={} {} {} -> {}",
            self.organizer_company,
            self.ship,
            self.po_number.map_or_else(|| "-".to_string(), |po| po.to_string()),
            self.pickup_time,
            self.pickup_location,
            self.destination
        )
    }
}

/// Which parties have already been sent a report covering this trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFlags {
    pub admin: bool,
    pub dispatch: bool,
    pub organizer: bool,
}

/// A shared vehicle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Option<TripId>,
    pub organizer_company: CompanyId,
    pub ship: ShipId,
    pub po_number: Option<u64>,
    pub pickup_time: PickupTime,
    pub pickup_location: Location,
    pub destination: Location,
    pub harbour: Option<Location>,
    pub region: Option<RegionId>,
    pub status: TripStatus,
    /// Set when the cancellation is billable.
    pub cancel_fee: bool,
    pub immigration: bool,
    /// Retention horizon; the trip may be purged after this.
    pub expires_at: NaiveDateTime,
    pub driver: Option<DriverId>,
    pub subcontractor_price: Option<f64>,
    pub external_price: Option<f64>,
    /// Semicolon-joined log of passenger remarks.
    pub passenger_remarks: Option<String>,
    /// Newline-joined log of driver remarks.
    pub driver_remarks: Option<String>,
    pub reported: ReportFlags,
}

impl Trip {
    /// A new `created` trip with no passengers.
    pub fn new(
        organizer_company: CompanyId,
        ship: ShipId,
        pickup_time: PickupTime,
        pickup_location: Location,
        destination: Location,
        expires_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: None,
            organizer_company,
            ship,
            po_number: None,
            pickup_time,
            pickup_location,
            destination,
            harbour: None,
            region: None,
            status: TripStatus::Created,
            cancel_fee: false,
            immigration: false,
            expires_at,
            driver: None,
            subcontractor_price: None,
            external_price: None,
            passenger_remarks: None,
            driver_remarks: None,
            reported: ReportFlags::default(),
        }
    }

    pub fn itinerary(&self) -> Itinerary {
        Itinerary {
            ship: self.ship,
            po_number: self.po_number,
            pickup_time: self.pickup_time,
            pickup_location: self.pickup_location.name.clone(),
            destination: self.destination.name.clone(),
        }
    }

    pub fn grouping_key(&self) -> GroupingKey {
        GroupingKey::new(self.organizer_company, &self.itinerary())
    }

    /// Whether the trip still accepts new passengers.
    pub fn is_open(&self) -> bool {
        self.status == TripStatus::Created
    }

    /// Whether `passenger` rides the same ship, time and route as this trip.
    ///
    /// PO number and company are not compared; this is the check used to
    /// absorb sibling records of one manifest into a freshly matched trip.
    pub fn carries(&self, passenger: &Passenger) -> bool {
        passenger.ship == Some(self.ship)
            && passenger.pickup_time == Some(self.pickup_time)
            && self.destination.is_named(&passenger.destination)
            && self.pickup_location.is_named(&passenger.pickup_location)
    }

    /// A fresh `created` copy of this trip on a different itinerary.
    ///
    /// Company, region, harbour, immigration and retention are kept; the
    /// copy has no id, no driver, no prices and empty remark logs.
    pub fn for_itinerary(&self, itinerary: &Itinerary, pickup_location: Location, destination: Location) -> Trip {
        let mut copy = Trip::new(
            self.organizer_company,
            itinerary.ship,
            itinerary.pickup_time,
            pickup_location,
            destination,
            self.expires_at,
        );
        copy.po_number = itinerary.po_number;
        copy.harbour = self.harbour.clone();
        copy.region = self.region;
        copy.immigration = self.immigration;
        copy
    }

    /// Move to `next`, enforcing the lifecycle.
    pub fn transition_to(&mut self, next: TripStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Append to the driver remark log.
    pub fn add_driver_remark(&mut self, remark: &str) {
        append_remark(&mut self.driver_remarks, remark, "\n");
    }

    /// Append to the passenger remark log.
    pub fn add_passenger_remark(&mut self, remark: &str) {
        append_remark(&mut self.passenger_remarks, remark, ";");
    }

    /// Whether every passenger in `roster` has cancelled.
    pub fn all_cancelled(roster: &[Passenger]) -> bool {
        roster.iter().all(Passenger::is_cancelled)
    }
}

fn append_remark(log: &mut Option<String>, remark: &str, separator: &str) {
    let remark = remark.trim();
    if remark.is_empty() {
        return;
    }
    match log {
        Some(existing) if !existing.is_empty() => {
            existing.push_str(separator);
            existing.push_str(remark);
        }
        _ => *log = Some(remark.to_string()),
    }
}

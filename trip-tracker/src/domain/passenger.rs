//! Passenger bookings.
//!
//! A `Passenger` is one traveller's single-leg booking. The same type is
//! used for freshly extracted manifest records (no id, no trip) and for
//! committed bookings, so errored records can be handed back to the
//! uploader alongside the ones that were persisted.

use serde::{Deserialize, Serialize};

use super::{
    DomainError, IngestionStatus, Itinerary, PassengerId, PickupTime, ReportId, ShipId, Trip,
    TripId, TripStatus, normalize_place,
};

/// References to generated report artifacts that include this passenger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRefs {
    pub admin: Option<ReportId>,
    pub organizer: Option<ReportId>,
    pub dispatcher: Option<ReportId>,
}

/// A single traveller's single-leg booking.
///
/// The itinerary fields (pickup time, pickup location, destination, ship,
/// PO number, harbour) are denormalised copies of the owning trip's; see
/// [`Passenger::adopt_itinerary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Option<PassengerId>,
    /// Owning trip, once attached.
    pub trip: Option<TripId>,
    /// Lifecycle status of the committed booking.
    pub status: TripStatus,
    /// What the manifest row asked for.
    pub ingestion: IngestionStatus,
    pub first_name: String,
    pub surname: String,
    pub flight: Option<String>,
    pub pickup_time: Option<PickupTime>,
    /// Normalised pickup place name.
    pub pickup_location: String,
    /// Normalised destination place name.
    pub destination: String,
    pub harbour: Option<String>,
    pub ship: Option<ShipId>,
    pub po_number: Option<u64>,
    pub immigration: bool,
    pub organization: Option<String>,
    pub remarks: Option<String>,
    /// False when the record must not be committed.
    pub valid: bool,
    /// Human-readable reason for the last problem seen with this record.
    pub error: Option<String>,
    pub cost: Option<f64>,
    pub reports: ReportRefs,
}

impl Passenger {
    /// A valid `add` record for the named traveller with no itinerary yet.
    pub fn new(first_name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            id: None,
            trip: None,
            status: TripStatus::Created,
            ingestion: IngestionStatus::Add,
            first_name: first_name.into(),
            surname: surname.into(),
            flight: None,
            pickup_time: None,
            pickup_location: String::new(),
            destination: String::new(),
            harbour: None,
            ship: None,
            po_number: None,
            immigration: false,
            organization: None,
            remarks: None,
            valid: true,
            error: None,
            cost: None,
            reports: ReportRefs::default(),
        }
    }

    /// Set the pickup time and route, normalising the place names.
    pub fn with_route(mut self, pickup_time: PickupTime, from: &str, to: &str) -> Self {
        self.pickup_time = Some(pickup_time);
        self.pickup_location = normalize_place(from);
        self.destination = normalize_place(to);
        self
    }

    /// Set the ship and PO number.
    pub fn with_ship(mut self, ship: ShipId, po_number: Option<u64>) -> Self {
        self.ship = Some(ship);
        self.po_number = po_number;
        self
    }

    /// Set the ingestion status.
    pub fn with_ingestion(mut self, ingestion: IngestionStatus) -> Self {
        self.ingestion = ingestion;
        self
    }

    /// "First Surname", for logs and messages.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }

    /// Whether every field needed to book a trip is present.
    pub fn has_required_fields(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.surname.trim().is_empty()
            && self.pickup_time.is_some()
            && !self.pickup_location.is_empty()
            && !self.destination.is_empty()
            && self.ship.is_some()
    }

    /// Whether the booking has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// Whether `other` names the same traveller.
    pub fn same_traveller(&self, other: &Passenger) -> bool {
        self.first_name == other.first_name && self.surname == other.surname
    }

    /// Mark the record as not committable, with a reason.
    pub fn invalidate(&mut self, reason: impl Into<String>) {
        self.valid = false;
        self.error = Some(reason.into());
    }

    /// Record a non-fatal problem without changing validity.
    pub fn annotate(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
    }

    /// The booking's itinerary, if ship and pickup time are known.
    pub fn itinerary(&self) -> Result<Itinerary, DomainError> {
        Ok(Itinerary {
            ship: self.ship.ok_or(DomainError::MissingField("ship"))?,
            po_number: self.po_number,
            pickup_time: self.pickup_time.ok_or(DomainError::MissingField("pickup time"))?,
            pickup_location: self.pickup_location.clone(),
            destination: self.destination.clone(),
        })
    }

    /// Overwrite the itinerary fields with `itinerary`.
    pub fn apply_itinerary(&mut self, itinerary: &Itinerary) {
        self.ship = Some(itinerary.ship);
        self.po_number = itinerary.po_number;
        self.pickup_time = Some(itinerary.pickup_time);
        self.pickup_location = normalize_place(&itinerary.pickup_location);
        self.destination = normalize_place(&itinerary.destination);
    }

    /// Attach to `trip`, copying every denormalised field from it.
    ///
    /// After this call the passenger's pickup time, pickup location,
    /// destination, ship, PO number and harbour equal the trip's exactly.
    pub fn adopt_itinerary(&mut self, trip: &Trip) {
        self.apply_itinerary(&trip.itinerary());
        if let Some(harbour) = &trip.harbour {
            self.harbour = Some(harbour.name.clone());
        }
        self.trip = trip.id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyId, Location};

    fn nine() -> PickupTime {
        PickupTime::parse("2024-06-01 09:00").unwrap()
    }

    #[test]
    fn new_record_is_valid_add() {
        let p = Passenger::new("Alice", "Smith");
        assert!(p.valid);
        assert_eq!(p.ingestion, IngestionStatus::Add);
        assert_eq!(p.status, TripStatus::Created);
        assert!(!p.has_required_fields());
    }

    #[test]
    fn route_is_normalised() {
        let p = Passenger::new("Alice", "Smith").with_route(nine(), " Pier A", "DOWNTOWN ");
        assert_eq!(p.pickup_location, "pier a");
        assert_eq!(p.destination, "downtown");
    }

    #[test]
    fn required_fields() {
        let p = Passenger::new("Alice", "Smith")
            .with_route(nine(), "Pier A", "Downtown")
            .with_ship(ShipId(1), Some(100));
        assert!(p.has_required_fields());

        let mut missing_name = p.clone();
        missing_name.surname = "  ".into();
        assert!(!missing_name.has_required_fields());
    }

    #[test]
    fn invalidate_sets_reason() {
        let mut p = Passenger::new("Alice", "Smith");
        p.annotate("odd row");
        assert!(p.valid);
        p.invalidate("broken row");
        assert!(!p.valid);
        assert_eq!(p.error.as_deref(), Some("broken row"));
    }

    #[test]
    fn adopt_itinerary_overwrites_denormalised_fields() {
        let expires = nine().to_datetime();
        let mut trip = Trip::new(
            CompanyId(1),
            ShipId(9),
            nine(),
            Location::named("Pier B"),
            Location::named("Airport"),
            expires,
        );
        trip.id = Some(TripId(4));
        trip.po_number = Some(77);
        trip.harbour = Some(Location::named("North Harbour"));

        let mut p = Passenger::new("Alice", "Smith")
            .with_route(PickupTime::parse("2024-06-02 10:00").unwrap(), "Pier A", "Downtown")
            .with_ship(ShipId(1), Some(100));
        p.adopt_itinerary(&trip);

        assert_eq!(p.trip, Some(TripId(4)));
        assert_eq!(p.pickup_time, Some(nine()));
        assert_eq!(p.pickup_location, "pier b");
        assert_eq!(p.destination, "airport");
        assert_eq!(p.ship, Some(ShipId(9)));
        assert_eq!(p.po_number, Some(77));
        assert_eq!(p.harbour.as_deref(), Some("north harbour"));
    }
}

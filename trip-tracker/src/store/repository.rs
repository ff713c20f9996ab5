//! Repository abstraction over persisted entities.
//!
//! The reconciliation core only ever talks to storage through these traits,
//! so it can run against the in-memory arena in tests and against any other
//! backend in production.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::{
    CompanyId, GroupingKey, Location, LocationId, OrganizerCompany, Passenger, PassengerId,
    PickupTime, Ship, ShipId, Trip, TripId, normalize_place,
};

use super::error::StoreError;

/// A persisted entity with a surrogate id assigned on first save.
pub trait Entity: Clone {
    /// The entity's id type.
    type Id: Copy + Ord + From<u64> + Into<u64> + fmt::Display;

    /// Name used in error messages.
    const KIND: &'static str;

    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);
}

macro_rules! impl_entity {
    ($ty:ty, $id:ty, $kind:literal) => {
        impl Entity for $ty {
            type Id = $id;
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<$id> {
                self.id
            }

            fn set_id(&mut self, id: $id) {
                self.id = Some(id);
            }
        }
    };
}

impl_entity!(Trip, TripId, "trip");
impl_entity!(Passenger, PassengerId, "passenger");
impl_entity!(Ship, ShipId, "ship");
impl_entity!(OrganizerCompany, CompanyId, "organizer company");
impl_entity!(Location, LocationId, "location");

/// A predicate over entities of type `T`.
pub trait Criteria<T> {
    fn matches(&self, entity: &T) -> bool;
}

/// Find/save/delete access to one entity type.
pub trait Repository<T: Entity> {
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, StoreError>;

    /// All entities matching `criteria`, in id order.
    fn find_matching(&self, criteria: &dyn Criteria<T>) -> Result<Vec<T>, StoreError>;

    /// Insert or replace. Entities without an id are assigned one; the
    /// saved entity is returned.
    fn save(&mut self, entity: T) -> Result<T, StoreError>;

    fn delete(&mut self, id: T::Id) -> Result<(), StoreError>;
}

/// Trip lookups used by the reconciliation core.
#[derive(Debug, Clone)]
pub enum TripQuery {
    /// `created` trips with exactly this grouping key.
    OpenWithKey(GroupingKey),
    /// Trips with this grouping key that can still take passengers
    /// (`created` or `assigned`).
    LiveWithKey(GroupingKey),
    /// Trips a passenger on `exclude` could be moved to.
    Transferable {
        organizer_company: CompanyId,
        ship: ShipId,
        po_number: Option<u64>,
        not_before: NaiveDateTime,
        exclude: TripId,
    },
    /// All trips of one organizer company.
    OwnedBy(CompanyId),
}

impl Criteria<Trip> for TripQuery {
    fn matches(&self, trip: &Trip) -> bool {
        match self {
            TripQuery::OpenWithKey(key) => trip.is_open() && &trip.grouping_key() == key,
            TripQuery::LiveWithKey(key) => trip.status.is_cancellable() && &trip.grouping_key() == key,
            TripQuery::Transferable {
                organizer_company,
                ship,
                po_number,
                not_before,
                exclude,
            } => {
                trip.id != Some(*exclude)
                    && trip.organizer_company == *organizer_company
                    && trip.ship == *ship
                    && trip.po_number == *po_number
                    && trip.status.is_cancellable()
                    && trip.pickup_time.to_datetime() >= *not_before
            }
            TripQuery::OwnedBy(company) => trip.organizer_company == *company,
        }
    }
}

/// Passenger lookups used by the reconciliation core.
#[derive(Debug, Clone)]
pub enum PassengerQuery {
    /// Passengers attached to a trip.
    OnTrip(TripId),
    /// Same traveller at the same pickup time.
    NameAndTime {
        first_name: String,
        surname: String,
        pickup_time: PickupTime,
    },
    /// Same traveller on the same route, at any time.
    NameAndRoute {
        first_name: String,
        surname: String,
        pickup_location: String,
        destination: String,
    },
    /// Same traveller, route and time.
    Exact {
        first_name: String,
        surname: String,
        pickup_location: String,
        destination: String,
        pickup_time: PickupTime,
    },
}

impl PassengerQuery {
    /// Match `record` by name and pickup time, if it has one.
    pub fn name_and_time(record: &Passenger) -> Option<Self> {
        Some(PassengerQuery::NameAndTime {
            first_name: record.first_name.clone(),
            surname: record.surname.clone(),
            pickup_time: record.pickup_time?,
        })
    }

    /// Match `record` by name and route.
    pub fn name_and_route(record: &Passenger) -> Self {
        PassengerQuery::NameAndRoute {
            first_name: record.first_name.clone(),
            surname: record.surname.clone(),
            pickup_location: normalize_place(&record.pickup_location),
            destination: normalize_place(&record.destination),
        }
    }

    /// Match `record` by name, route and pickup time, if it has one.
    ///
    /// Ship and PO number are not compared. A traveller holds at most one
    /// active booking per pickup time, so name and time already single out
    /// the booking; the route only tells a repeat from a clash.
    pub fn exact(record: &Passenger) -> Option<Self> {
        Some(PassengerQuery::Exact {
            first_name: record.first_name.clone(),
            surname: record.surname.clone(),
            pickup_location: normalize_place(&record.pickup_location),
            destination: normalize_place(&record.destination),
            pickup_time: record.pickup_time?,
        })
    }
}

impl Criteria<Passenger> for PassengerQuery {
    fn matches(&self, p: &Passenger) -> bool {
        match self {
            PassengerQuery::OnTrip(trip) => p.trip == Some(*trip),
            PassengerQuery::NameAndTime {
                first_name,
                surname,
                pickup_time,
            } => &p.first_name == first_name && &p.surname == surname && p.pickup_time == Some(*pickup_time),
            PassengerQuery::NameAndRoute {
                first_name,
                surname,
                pickup_location,
                destination,
            } => {
                &p.first_name == first_name
                    && &p.surname == surname
                    && &p.pickup_location == pickup_location
                    && &p.destination == destination
            }
            PassengerQuery::Exact {
                first_name,
                surname,
                pickup_location,
                destination,
                pickup_time,
            } => {
                &p.first_name == first_name
                    && &p.surname == surname
                    && &p.pickup_location == pickup_location
                    && &p.destination == destination
                    && p.pickup_time == Some(*pickup_time)
            }
        }
    }
}

/// Ship lookups.
#[derive(Debug, Clone)]
pub enum ShipQuery {
    /// Ships with this name (case-insensitive).
    Named(String),
}

impl Criteria<Ship> for ShipQuery {
    fn matches(&self, ship: &Ship) -> bool {
        match self {
            ShipQuery::Named(name) => ship.name.trim().eq_ignore_ascii_case(name.trim()),
        }
    }
}

/// Organizer company lookups.
#[derive(Debug, Clone)]
pub enum CompanyQuery {
    /// Companies with this name (case-insensitive).
    Named(String),
}

impl Criteria<OrganizerCompany> for CompanyQuery {
    fn matches(&self, company: &OrganizerCompany) -> bool {
        match self {
            CompanyQuery::Named(name) => company.name.trim().eq_ignore_ascii_case(name.trim()),
        }
    }
}

/// Location lookups.
#[derive(Debug, Clone)]
pub enum LocationQuery {
    /// Every stored location.
    All,
    /// Locations with this normalised name.
    Named(String),
}

impl Criteria<Location> for LocationQuery {
    fn matches(&self, location: &Location) -> bool {
        match self {
            LocationQuery::All => true,
            LocationQuery::Named(name) => location.is_named(name),
        }
    }
}

/// Everything the reconciliation core needs from persistence.
///
/// Implemented for any type that provides all five repositories.
pub trait Store:
    Repository<Trip>
    + Repository<Passenger>
    + Repository<Ship>
    + Repository<OrganizerCompany>
    + Repository<Location>
{
    fn trip(&self, id: TripId) -> Result<Trip, StoreError> {
        Repository::<Trip>::find_by_id(self, id)?.ok_or_else(|| StoreError::not_found(Trip::KIND, id))
    }

    fn passenger(&self, id: PassengerId) -> Result<Passenger, StoreError> {
        Repository::<Passenger>::find_by_id(self, id)?
            .ok_or_else(|| StoreError::not_found(Passenger::KIND, id))
    }

    fn trips_matching(&self, query: &TripQuery) -> Result<Vec<Trip>, StoreError> {
        Repository::<Trip>::find_matching(self, query)
    }

    fn passengers_matching(&self, query: &PassengerQuery) -> Result<Vec<Passenger>, StoreError> {
        Repository::<Passenger>::find_matching(self, query)
    }

    /// The derived roster of a trip.
    fn passengers_on(&self, trip: TripId) -> Result<Vec<Passenger>, StoreError> {
        self.passengers_matching(&PassengerQuery::OnTrip(trip))
    }

    /// The `created` trip with this grouping key, if any.
    fn find_open_trip(&self, key: &GroupingKey) -> Result<Option<Trip>, StoreError> {
        Ok(self
            .trips_matching(&TripQuery::OpenWithKey(key.clone()))?
            .into_iter()
            .next())
    }

    /// First match for `query`, preferring bookings that are not cancelled.
    fn find_passenger(&self, query: &PassengerQuery) -> Result<Option<Passenger>, StoreError> {
        let matches = self.passengers_matching(query)?;
        let active = matches.iter().position(|p| !p.is_cancelled());
        Ok(match active {
            Some(idx) => matches.into_iter().nth(idx),
            None => matches.into_iter().next(),
        })
    }

    /// Whether a booking that is not cancelled matches `query`.
    fn has_active_passenger(&self, query: &PassengerQuery) -> Result<bool, StoreError> {
        Ok(self
            .passengers_matching(query)?
            .iter()
            .any(|p| !p.is_cancelled()))
    }

    fn save_trip(&mut self, trip: Trip) -> Result<Trip, StoreError> {
        Repository::<Trip>::save(self, trip)
    }

    fn save_passenger(&mut self, passenger: Passenger) -> Result<Passenger, StoreError> {
        Repository::<Passenger>::save(self, passenger)
    }

    fn delete_trip(&mut self, id: TripId) -> Result<(), StoreError> {
        Repository::<Trip>::delete(self, id)
    }

    fn delete_passenger(&mut self, id: PassengerId) -> Result<(), StoreError> {
        Repository::<Passenger>::delete(self, id)
    }

    fn find_ship(&self, name: &str) -> Result<Option<Ship>, StoreError> {
        Ok(Repository::<Ship>::find_matching(self, &ShipQuery::Named(name.to_string()))?
            .into_iter()
            .next())
    }

    fn save_ship(&mut self, ship: Ship) -> Result<Ship, StoreError> {
        Repository::<Ship>::save(self, ship)
    }

    fn find_company(&self, name: &str) -> Result<Option<OrganizerCompany>, StoreError> {
        Ok(
            Repository::<OrganizerCompany>::find_matching(self, &CompanyQuery::Named(name.to_string()))?
                .into_iter()
                .next(),
        )
    }

    fn save_company(&mut self, company: OrganizerCompany) -> Result<OrganizerCompany, StoreError> {
        Repository::<OrganizerCompany>::save(self, company)
    }

    fn locations(&self) -> Result<Vec<Location>, StoreError> {
        Repository::<Location>::find_matching(self, &LocationQuery::All)
    }

    /// Save a location, replacing any stored location with the same name.
    fn save_location(&mut self, mut location: Location) -> Result<Location, StoreError> {
        if location.id.is_none() {
            let existing = Repository::<Location>::find_matching(self, &LocationQuery::Named(location.name.clone()))?;
            location.id = existing.first().and_then(|l| l.id);
        }
        Repository::<Location>::save(self, location)
    }
}

impl<S> Store for S where
    S: Repository<Trip>
        + Repository<Passenger>
        + Repository<Ship>
        + Repository<OrganizerCompany>
        + Repository<Location>
{
}

//! Finding or opening the trip a new booking rides on.

use chrono::Months;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{CompanyId, GroupingKey, Itinerary, Location, Passenger, PickupTime, Trip};
use crate::locations::LocationResolver;
use crate::store::Store;

use super::caller::{Caller, Role};
use super::clock::Clock;
use super::engine::Reconciler;
use super::error::ReconcileError;

/// A trip booked by hand rather than from a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualTripOrder {
    /// Company name; only admins name it, everyone else books for their own.
    #[serde(default)]
    pub organizer_company: Option<String>,
    /// Ship name, looked up among the company's ships.
    pub ship: String,
    #[serde(default)]
    pub po_number: Option<u64>,
    pub pickup_time: PickupTime,
    pub pickup_location: String,
    pub destination: String,
    #[serde(default)]
    pub harbour: Option<String>,
    #[serde(default)]
    pub immigration: bool,
    #[serde(default)]
    pub passenger_remarks: Option<String>,
}

impl<S: Store, R: LocationResolver, C: Clock> Reconciler<S, R, C> {
    /// The open trip `passenger` should join, created if there is none.
    ///
    /// Only `created` trips take new passengers. A new trip copies the
    /// passenger's immigration flag and gets its region from the harbour
    /// when that can be resolved. The passenger itself is not attached.
    pub fn find_or_create_trip(
        &mut self,
        passenger: &Passenger,
        company: CompanyId,
    ) -> Result<Trip, ReconcileError> {
        let (itinerary, pickup, destination) = self.resolve_itinerary(passenger)?;
        let key = GroupingKey::new(company, &itinerary);

        if let Some(trip) = self.store.find_open_trip(&key)? {
            debug!(trip = ?trip.id, %key, "joining open trip");
            return Ok(trip);
        }

        let mut trip = self.new_trip(
            company,
            &itinerary,
            pickup,
            destination,
            passenger.harbour.as_deref(),
        )?;
        trip.immigration = passenger.immigration;

        let trip = self.store.save_trip(trip)?;
        info!(trip = ?trip.id, %key, "opened trip");
        Ok(trip)
    }

    /// Open a trip from a hand-written order, with no passengers.
    ///
    /// Admins book for the company the order names; managers and organizers
    /// for their own. The ship must belong to that company.
    pub fn create_manual_trip(
        &mut self,
        caller: &Caller,
        order: &ManualTripOrder,
    ) -> Result<Trip, ReconcileError> {
        let company = self.ordering_company(caller, order)?;
        let ship = self
            .store
            .find_ship(&order.ship)?
            .filter(|ship| ship.organizer_company == company)
            .and_then(|ship| ship.id)
            .ok_or_else(|| ReconcileError::not_found("ship", &order.ship))?;

        let itinerary = Itinerary {
            ship,
            po_number: order.po_number,
            pickup_time: order.pickup_time,
            pickup_location: order.pickup_location.clone(),
            destination: order.destination.clone(),
        };
        let (itinerary, pickup, destination) = self.resolve_places(itinerary)?;
        let key = GroupingKey::new(company, &itinerary);
        if self.store.find_open_trip(&key)?.is_some() {
            return Err(ReconcileError::Conflict(format!(
                "an open trip already exists for {key}"
            )));
        }

        let mut trip = self.new_trip(company, &itinerary, pickup, destination, order.harbour.as_deref())?;
        trip.immigration = order.immigration;
        trip.passenger_remarks = order.passenger_remarks.clone();

        let trip = self.store.save_trip(trip)?;
        info!(trip = ?trip.id, %key, "opened trip from manual order");
        Ok(trip)
    }

    fn ordering_company(
        &self,
        caller: &Caller,
        order: &ManualTripOrder,
    ) -> Result<CompanyId, ReconcileError> {
        match caller.role {
            Role::Admin => {
                let name = order.organizer_company.as_deref().ok_or_else(|| {
                    ReconcileError::InvalidArgument("organizer company is required".into())
                })?;
                self.store
                    .find_company(name)?
                    .and_then(|company| company.id)
                    .ok_or_else(|| ReconcileError::not_found("organizer company", name))
            }
            Role::Manager | Role::Organizer => caller.company.ok_or_else(|| {
                ReconcileError::AccessDenied("caller has no organizer company".into())
            }),
            Role::Dispatcher => Err(ReconcileError::AccessDenied(
                "dispatchers may not order trips".into(),
            )),
        }
    }

    /// An unsaved `created` trip for `itinerary`, with its places stored.
    ///
    /// Expiry comes from `retention_months`. The region is taken from the
    /// harbour when it resolves; a harbour that does not is only logged.
    pub(super) fn new_trip(
        &mut self,
        company: CompanyId,
        itinerary: &Itinerary,
        pickup: Location,
        destination: Location,
        harbour: Option<&str>,
    ) -> Result<Trip, ReconcileError> {
        let now = self.now();
        let expires_at = now
            .checked_add_months(Months::new(self.config.retention_months))
            .unwrap_or(now);

        let pickup = self.store.save_location(pickup)?;
        let destination = self.store.save_location(destination)?;

        let mut trip = Trip::new(
            company,
            itinerary.ship,
            itinerary.pickup_time,
            pickup,
            destination,
            expires_at,
        );
        trip.po_number = itinerary.po_number;

        if let Some(harbour) = harbour {
            match self.resolver.resolve(harbour) {
                Ok(location) => {
                    if location.region.is_none() {
                        warn!(harbour, "no region for harbour");
                    }
                    trip.region = location.region;
                    trip.harbour = Some(location);
                }
                Err(e) => warn!(harbour, error = %e, "could not resolve harbour"),
            }
        }
        Ok(trip)
    }

    /// The passenger's itinerary with its places replaced by their
    /// canonical names, plus the resolved places.
    pub(super) fn resolve_itinerary(
        &self,
        passenger: &Passenger,
    ) -> Result<(Itinerary, Location, Location), ReconcileError> {
        self.resolve_places(passenger.itinerary()?)
    }

    fn resolve_places(
        &self,
        mut itinerary: Itinerary,
    ) -> Result<(Itinerary, Location, Location), ReconcileError> {
        let pickup = self.resolver.resolve(&itinerary.pickup_location)?;
        let destination = self.resolver.resolve(&itinerary.destination)?;
        itinerary.pickup_location = pickup.name.clone();
        itinerary.destination = destination.name.clone();
        Ok((itinerary, pickup, destination))
    }
}

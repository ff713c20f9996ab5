//! Cancelling, changing and moving bookings, and whole-trip edits.

use tracing::{debug, info};

use crate::domain::{
    CANCELLATION_FEE_REMARK, GroupingKey, Itinerary, Passenger, PassengerId, Trip, TripId,
    TripStatus,
};
use crate::locations::LocationResolver;
use crate::store::{PassengerQuery, Store, TripQuery};

use super::caller::Caller;
use super::clock::Clock;
use super::engine::Reconciler;
use super::error::ReconcileError;

/// What happened to a trip after a passenger left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacatedTrip {
    /// Active passengers remain.
    Kept,
    /// Empty and far enough ahead of pickup: removed.
    Deleted,
    /// Empty inside the cancellation window, or left with only cancelled
    /// passengers: cancelled.
    Cancelled,
}

impl<S: Store, R: LocationResolver, C: Clock> Reconciler<S, R, C> {
    /// Cancel the booking matching `record` exactly (name, route, time).
    ///
    /// When this leaves every passenger on the trip cancelled, the trip is
    /// cancelled too, with a fee remark if pickup is inside the cascade
    /// threshold. Cancelling an already cancelled booking is a no-op.
    pub fn cancel_single(
        &mut self,
        caller: &Caller,
        record: &Passenger,
    ) -> Result<Passenger, ReconcileError> {
        let query = PassengerQuery::exact(record)
            .ok_or_else(|| ReconcileError::InvalidArgument("pickup time is required".into()))?;
        let mut passenger = self
            .store
            .find_passenger(&query)?
            .ok_or_else(|| ReconcileError::not_found("passenger", record.full_name()))?;
        let mut trip = self.trip_of(&passenger)?;

        if trip.status.has_started() {
            return Err(ReconcileError::invalid_state(
                "cannot cancel an in-progress or completed trip",
            ));
        }
        caller.ensure_manages(&trip)?;

        if passenger.is_cancelled() {
            return Ok(passenger);
        }
        passenger.status = TripStatus::Cancelled;
        let passenger = self.store.save_passenger(passenger)?;
        info!(passenger = %passenger.full_name(), trip = ?trip.id, "cancelled booking");

        if self.cascade_cancel(&mut trip)? {
            if trip.pickup_time.time_until(self.now()) < self.config.cascade_fee_threshold() {
                trip.add_driver_remark(CANCELLATION_FEE_REMARK);
            }
            self.store.save_trip(trip)?;
        }
        Ok(passenger)
    }

    /// Flip a booking between cancelled and active.
    ///
    /// Cancelling the last active passenger cancels the trip and, inside
    /// the toggle threshold, flags the fee. Reactivating a passenger on a
    /// cancelled trip reopens the trip.
    pub fn toggle_cancel(
        &mut self,
        caller: &Caller,
        passenger_id: PassengerId,
    ) -> Result<Passenger, ReconcileError> {
        let mut passenger = self.store.passenger(passenger_id)?;
        let mut trip = self.trip_of(&passenger)?;
        caller.ensure_manages(&trip)?;
        if trip.status.has_started() {
            return Err(ReconcileError::invalid_state(
                "cannot cancel an in-progress or completed trip",
            ));
        }

        if passenger.is_cancelled() {
            if trip.status.is_cancelled() {
                trip.status = TripStatus::Created;
                trip.cancel_fee = false;
                trip = self.store.save_trip(trip)?;
                info!(trip = ?trip.id, "reopened trip");
            }
            passenger.status = trip.status;
            let passenger = self.store.save_passenger(passenger)?;
            info!(passenger = %passenger.full_name(), "reactivated booking");
            return Ok(passenger);
        }

        passenger.status = TripStatus::Cancelled;
        let passenger = self.store.save_passenger(passenger)?;
        info!(passenger = %passenger.full_name(), "cancelled booking");

        if self.cascade_cancel(&mut trip)? {
            if trip.pickup_time.time_until(self.now()) < self.config.toggle_fee_threshold() {
                trip.cancel_fee = true;
                trip.add_driver_remark(CANCELLATION_FEE_REMARK);
            }
            self.store.save_trip(trip)?;
        }
        Ok(passenger)
    }

    /// Cancel `trip` in memory if every passenger on it is cancelled.
    ///
    /// Returns whether it did; the caller saves the trip.
    fn cascade_cancel(&self, trip: &mut Trip) -> Result<bool, ReconcileError> {
        let id = stored_id(trip)?;
        let roster = self.store.passengers_on(id)?;
        if trip.status.is_cancelled() || !Trip::all_cancelled(&roster) {
            return Ok(false);
        }
        trip.transition_to(TripStatus::Cancelled)?;
        info!(trip = %id, "all passengers cancelled, cancelled trip");
        Ok(true)
    }

    /// Move a booking onto the itinerary described by `changed`.
    ///
    /// The passenger joins a trip of the same company that already has the
    /// new grouping key and can still take passengers. If there is none,
    /// the old trip is cloned onto the new itinerary. The trip left behind
    /// is settled like after a transfer.
    pub fn change_reconcile(
        &mut self,
        caller: &Caller,
        passenger_id: PassengerId,
        changed: &Passenger,
    ) -> Result<Passenger, ReconcileError> {
        let mut passenger = self.store.passenger(passenger_id)?;
        let old_trip = self.trip_of(&passenger)?;
        let old_id = stored_id(&old_trip)?;
        caller.ensure_manages(&old_trip)?;
        if old_trip.status.has_started() {
            return Err(ReconcileError::invalid_state(
                "cannot change a booking on an in-progress or completed trip",
            ));
        }

        let (itinerary, pickup, destination) = self.resolve_itinerary(changed)?;
        let key = GroupingKey::new(old_trip.organizer_company, &itinerary);
        let remark = changed.remarks.clone().or_else(|| passenger.remarks.clone());

        let existing = self
            .store
            .trips_matching(&TripQuery::LiveWithKey(key))?
            .into_iter()
            .next();
        let target = match existing {
            Some(trip) => trip,
            None => {
                let pickup = self.store.save_location(pickup)?;
                let destination = self.store.save_location(destination)?;
                let mut clone = old_trip.for_itinerary(&itinerary, pickup, destination);
                if let Some(remark) = &remark {
                    clone.add_passenger_remark(remark);
                }
                let clone = self.store.save_trip(clone)?;
                info!(from = %old_id, to = ?clone.id, "cloned trip for changed booking");
                clone
            }
        };

        if changed.flight.is_some() {
            passenger.flight = changed.flight.clone();
        }
        passenger.remarks = remark;

        if target.id == Some(old_id) {
            debug!(passenger = %passenger.full_name(), "change keeps the same trip");
            return Ok(self.store.save_passenger(passenger)?);
        }

        passenger.adopt_itinerary(&target);
        passenger.status = target.status;
        let passenger = self.store.save_passenger(passenger)?;
        info!(passenger = %passenger.full_name(), from = %old_id, to = ?target.id, "changed booking");

        self.settle_vacated_trip(old_id)?;
        Ok(passenger)
    }

    /// Move a passenger to another trip of the same company.
    ///
    /// The only passenger of a trip cannot be moved this way.
    pub fn transfer_passenger(
        &mut self,
        caller: &Caller,
        passenger_id: PassengerId,
        target_id: TripId,
    ) -> Result<Passenger, ReconcileError> {
        let mut passenger = self.store.passenger(passenger_id)?;
        let source = self.trip_of(&passenger)?;
        let source_id = stored_id(&source)?;
        let target = self.store.trip(target_id)?;

        caller.ensure_manages(&source)?;
        caller.ensure_manages(&target)?;
        if source.organizer_company != target.organizer_company {
            return Err(ReconcileError::AccessDenied(
                "trips belong to different organizer companies".into(),
            ));
        }
        if source_id == target_id {
            return Err(ReconcileError::InvalidArgument(
                "passenger is already on this trip".into(),
            ));
        }
        if source.status.has_started() {
            return Err(ReconcileError::invalid_state(format!(
                "cannot transfer from a {} trip",
                source.status
            )));
        }
        if !target.status.is_cancellable() {
            return Err(ReconcileError::invalid_state(format!(
                "cannot transfer to a {} trip",
                target.status
            )));
        }
        if self.store.passengers_on(source_id)?.len() < 2 {
            return Err(ReconcileError::invalid_state(
                "passenger will not be moved: only passenger in trip",
            ));
        }

        passenger.adopt_itinerary(&target);
        passenger.status = target.status;
        let passenger = self.store.save_passenger(passenger)?;
        info!(passenger = %passenger.full_name(), from = %source_id, to = %target_id, "transferred passenger");

        self.settle_vacated_trip(source_id)?;
        Ok(passenger)
    }

    /// Move a passenger off a shared trip onto a trip of their own.
    ///
    /// The new trip keeps the passenger's itinerary, so it cannot be opened
    /// while an open trip with that grouping key exists; that includes a
    /// `created` source trip.
    pub fn split_passenger(
        &mut self,
        caller: &Caller,
        passenger_id: PassengerId,
    ) -> Result<Passenger, ReconcileError> {
        let mut passenger = self.store.passenger(passenger_id)?;
        let source = self.trip_of(&passenger)?;
        let source_id = stored_id(&source)?;
        caller.ensure_manages(&source)?;

        if !source.status.is_cancellable() {
            return Err(ReconcileError::invalid_state(format!(
                "cannot split a booking off a {} trip",
                source.status
            )));
        }
        if passenger.is_cancelled() {
            return Err(ReconcileError::invalid_state(
                "cannot split off a cancelled booking",
            ));
        }
        if self.store.passengers_on(source_id)?.len() < 2 {
            return Err(ReconcileError::invalid_state(
                "passenger will not be moved: only passenger in trip",
            ));
        }

        let (itinerary, pickup, destination) = self.resolve_itinerary(&passenger)?;
        let key = GroupingKey::new(source.organizer_company, &itinerary);
        if self.store.find_open_trip(&key)?.is_some() {
            return Err(ReconcileError::Conflict(format!(
                "an open trip already exists for {key}"
            )));
        }

        let mut trip = self.new_trip(
            source.organizer_company,
            &itinerary,
            pickup,
            destination,
            passenger.harbour.as_deref(),
        )?;
        trip.immigration = passenger.immigration;
        let trip = self.store.save_trip(trip)?;

        passenger.adopt_itinerary(&trip);
        passenger.status = trip.status;
        let passenger = self.store.save_passenger(passenger)?;
        info!(passenger = %passenger.full_name(), from = %source_id, to = ?trip.id, "split passenger onto new trip");

        self.settle_vacated_trip(source_id)?;
        Ok(passenger)
    }

    /// Deal with a trip a passenger just left.
    ///
    /// An empty trip is deleted when pickup is more than the vacated-trip
    /// threshold away, and otherwise cancelled with a fee remark. A trip
    /// whose remaining passengers are all cancelled is cancelled like after
    /// [`cancel_single`](Self::cancel_single).
    pub fn settle_vacated_trip(&mut self, trip_id: TripId) -> Result<VacatedTrip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        let time_to_pickup = trip.pickup_time.time_until(self.now());

        if !self.store.passengers_on(trip_id)?.is_empty() {
            if !self.cascade_cancel(&mut trip)? {
                return Ok(VacatedTrip::Kept);
            }
            if time_to_pickup < self.config.cascade_fee_threshold() {
                trip.add_driver_remark(CANCELLATION_FEE_REMARK);
            }
            self.store.save_trip(trip)?;
            info!(trip = %trip_id, "only cancelled passengers left, cancelled trip");
            return Ok(VacatedTrip::Cancelled);
        }

        if time_to_pickup > self.config.vacated_trip_threshold() {
            self.store.delete_trip(trip_id)?;
            info!(trip = %trip_id, "deleted empty trip");
            return Ok(VacatedTrip::Deleted);
        }

        if !trip.status.is_cancelled() {
            trip.transition_to(TripStatus::Cancelled)?;
        }
        trip.add_driver_remark(CANCELLATION_FEE_REMARK);
        self.store.save_trip(trip)?;
        info!(trip = %trip_id, "cancelled empty trip inside the cancellation window");
        Ok(VacatedTrip::Cancelled)
    }

    /// Cancel a whole trip and every passenger on it.
    pub fn cancel_trip(&mut self, caller: &Caller, trip_id: TripId) -> Result<Trip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        caller.ensure_manages(&trip)?;
        trip.transition_to(TripStatus::Cancelled)?;

        for mut passenger in self.store.passengers_on(trip_id)? {
            if !passenger.is_cancelled() {
                passenger.status = TripStatus::Cancelled;
                self.store.save_passenger(passenger)?;
            }
        }

        if trip.pickup_time.time_until(self.now()) < self.config.cancel_trip_fee_threshold() {
            trip.cancel_fee = true;
            trip.add_driver_remark(CANCELLATION_FEE_REMARK);
        }
        let trip = self.store.save_trip(trip)?;
        info!(trip = %trip_id, fee = trip.cancel_fee, "cancelled trip");
        Ok(trip)
    }

    /// Trips a passenger could be transferred to: same company, ship and
    /// PO number, still cancellable, pickup not in the past.
    pub fn transferable_trips(
        &self,
        caller: &Caller,
        passenger_id: PassengerId,
    ) -> Result<Vec<Trip>, ReconcileError> {
        let passenger = self.store.passenger(passenger_id)?;
        let trip = self.trip_of(&passenger)?;
        caller.ensure_manages(&trip)?;

        let query = TripQuery::Transferable {
            organizer_company: trip.organizer_company,
            ship: trip.ship,
            po_number: trip.po_number,
            not_before: self.now(),
            exclude: stored_id(&trip)?,
        };
        Ok(self.store.trips_matching(&query)?)
    }

    /// Move a whole trip to a new itinerary.
    ///
    /// Every passenger on the trip is updated to the new itinerary.
    pub fn reschedule_trip(
        &mut self,
        caller: &Caller,
        trip_id: TripId,
        itinerary: &Itinerary,
    ) -> Result<Trip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        caller.ensure_manages(&trip)?;
        if !trip.status.is_cancellable() {
            return Err(ReconcileError::invalid_state(format!(
                "cannot reschedule a {} trip",
                trip.status
            )));
        }

        let pickup = self.resolver.resolve(&itinerary.pickup_location)?;
        let destination = self.resolver.resolve(&itinerary.destination)?;
        trip.ship = itinerary.ship;
        trip.po_number = itinerary.po_number;
        trip.pickup_time = itinerary.pickup_time;
        trip.pickup_location = self.store.save_location(pickup)?;
        trip.destination = self.store.save_location(destination)?;
        let trip = self.store.save_trip(trip)?;

        for mut passenger in self.store.passengers_on(trip_id)? {
            passenger.adopt_itinerary(&trip);
            self.store.save_passenger(passenger)?;
        }
        info!(trip = %trip_id, key = %trip.grouping_key(), "rescheduled trip");
        Ok(trip)
    }

    /// Remove a trip and every passenger on it.
    pub fn delete_trip(&mut self, caller: &Caller, trip_id: TripId) -> Result<(), ReconcileError> {
        let trip = self.store.trip(trip_id)?;
        caller.ensure_manages(&trip)?;

        let roster = self.store.passengers_on(trip_id)?;
        let count = roster.len();
        for passenger in roster {
            if let Some(id) = passenger.id {
                self.store.delete_passenger(id)?;
            }
        }
        self.store.delete_trip(trip_id)?;
        info!(trip = %trip_id, passengers = count, "deleted trip");
        Ok(())
    }

    pub(super) fn trip_of(&self, passenger: &Passenger) -> Result<Trip, ReconcileError> {
        let id = passenger.trip.ok_or_else(|| {
            ReconcileError::invalid_state(format!("{} is not on a trip", passenger.full_name()))
        })?;
        Ok(self.store.trip(id)?)
    }
}

fn stored_id(trip: &Trip) -> Result<TripId, ReconcileError> {
    trip.id
        .ok_or_else(|| ReconcileError::invalid_state("trip has not been saved"))
}

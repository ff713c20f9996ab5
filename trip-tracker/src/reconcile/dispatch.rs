//! Running trips: status, drivers, prices and driver remarks.

use tracing::info;

use crate::domain::{DriverId, Trip, TripId, TripStatus};
use crate::locations::LocationResolver;
use crate::store::Store;

use super::caller::Caller;
use super::clock::Clock;
use super::engine::Reconciler;
use super::error::ReconcileError;

impl<S: Store, R: LocationResolver, C: Clock> Reconciler<S, R, C> {
    /// Advance a trip along `created → assigned → in_progress → completed`.
    ///
    /// Active passengers follow the trip's status. Cancellation goes through
    /// [`Reconciler::cancel_trip`] instead.
    pub fn set_trip_status(
        &mut self,
        caller: &Caller,
        trip_id: TripId,
        status: TripStatus,
    ) -> Result<Trip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        caller.ensure_dispatches(&trip)?;
        if status.is_cancelled() {
            return Err(ReconcileError::InvalidArgument(
                "trips are cancelled by their organizer".into(),
            ));
        }

        let from = trip.status;
        trip.transition_to(status)?;
        let trip = self.store.save_trip(trip)?;
        self.sync_passenger_status(trip_id, status)?;
        info!(trip = %trip_id, %from, to = %status, "trip status changed");
        Ok(trip)
    }

    /// Put a driver on a trip, moving a `created` trip to `assigned`.
    ///
    /// Refused once pickup is more than the assignment cut-off in the past.
    pub fn assign_driver(
        &mut self,
        caller: &Caller,
        trip_id: TripId,
        driver: DriverId,
    ) -> Result<Trip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        caller.ensure_dispatches(&trip)?;
        if !trip.status.is_cancellable() {
            return Err(ReconcileError::invalid_state(format!(
                "cannot assign a driver to a {} trip",
                trip.status
            )));
        }
        if trip.pickup_time.time_until(self.now()) < -self.config.assignment_cutoff() {
            return Err(ReconcileError::invalid_state(
                "assignment cut-off has passed",
            ));
        }

        info!(trip = %trip_id, %driver, "assigned driver");
        trip.driver = Some(driver);
        let promote = trip.status == TripStatus::Created;
        if promote {
            trip.transition_to(TripStatus::Assigned)?;
        }
        let trip = self.store.save_trip(trip)?;
        if promote {
            self.sync_passenger_status(trip_id, TripStatus::Assigned)?;
        }
        Ok(trip)
    }

    /// Set the subcontractor price; the external price adds the margin.
    pub fn set_price(
        &mut self,
        caller: &Caller,
        trip_id: TripId,
        subcontractor_price: f64,
    ) -> Result<Trip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        caller.ensure_dispatches(&trip)?;
        if !subcontractor_price.is_finite() || subcontractor_price < 0.0 {
            return Err(ReconcileError::InvalidArgument(format!(
                "invalid price {subcontractor_price}"
            )));
        }

        trip.subcontractor_price = Some(subcontractor_price);
        trip.external_price = Some(subcontractor_price * (1.0 + self.config.price_margin));
        Ok(self.store.save_trip(trip)?)
    }

    /// Append to the trip's driver remark log.
    ///
    /// Allowed for anyone who manages or dispatches the trip.
    pub fn add_driver_remark(
        &mut self,
        caller: &Caller,
        trip_id: TripId,
        remark: &str,
    ) -> Result<Trip, ReconcileError> {
        let mut trip = self.store.trip(trip_id)?;
        if !caller.can_manage(&trip) {
            caller.ensure_dispatches(&trip)?;
        }
        if remark.trim().is_empty() {
            return Err(ReconcileError::InvalidArgument("remark is empty".into()));
        }

        trip.add_driver_remark(remark);
        Ok(self.store.save_trip(trip)?)
    }

    fn sync_passenger_status(&mut self, trip_id: TripId, status: TripStatus) -> Result<(), ReconcileError> {
        for mut passenger in self.store.passengers_on(trip_id)? {
            if !passenger.is_cancelled() {
                passenger.status = status;
                self.store.save_passenger(passenger)?;
            }
        }
        Ok(())
    }
}

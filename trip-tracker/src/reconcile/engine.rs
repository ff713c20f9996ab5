//! Manifest ingestion.
//!
//! A batch of extracted records is validated, checked for double bookings,
//! split by ingestion status and applied: `add` records are grouped into
//! trips, `cancel` and `change` records are applied to existing bookings.
//! Problems with a single record are logged and written onto that record;
//! they never stop the rest of the batch.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{CompanyId, IngestionStatus, Passenger, PassengerId, Trip};
use crate::locations::LocationResolver;
use crate::store::{PassengerQuery, Store};

use super::caller::Caller;
use super::clock::Clock;
use super::config::ReconcileConfig;
use super::conflicts::{CONFLICT_ERROR, flag_conflicts};
use super::error::ReconcileError;

/// Annotation for `add` records that repeat an existing booking.
pub const ALREADY_EXISTS: &str = "Passenger already exist with this name and time";

/// Annotation for `change` records that match no existing booking.
pub const NO_SUCH_PASSENGER: &str = "Passenger does not exist";

/// Per-status counts of one ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub added: usize,
    pub cancelled: usize,
    pub changed: usize,
    /// Invalid records and records that were already applied.
    pub skipped: usize,
    /// Records rejected as conflicts or failed while being applied.
    pub failed: usize,
}

/// Outcome of [`Reconciler::ingest`].
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    /// Every input record, committed or annotated.
    pub records: Vec<Passenger>,
    pub summary: IngestSummary,
}

/// The reconciliation core: ingestion, trip matching and lifecycle
/// operations over one store.
pub struct Reconciler<S, R, C> {
    pub(super) store: S,
    pub(super) resolver: R,
    pub(super) clock: C,
    pub(super) config: ReconcileConfig,
}

impl<S: Store, R: LocationResolver, C: Clock> Reconciler<S, R, C> {
    pub fn new(store: S, resolver: R, clock: C, config: ReconcileConfig) -> Self {
        Self {
            store,
            resolver,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Upload-time check of a batch. Nothing is persisted.
    ///
    /// `add` records that repeat a booking which is not cancelled are
    /// annotated with [`ALREADY_EXISTS`]; then double bookings within the
    /// batch are flagged.
    pub fn preview(&self, mut records: Vec<Passenger>) -> Result<Vec<Passenger>, ReconcileError> {
        for record in records
            .iter_mut()
            .filter(|r| r.ingestion == IngestionStatus::Add)
        {
            if let Some(query) = PassengerQuery::name_and_time(record)
                && self.store.has_active_passenger(&query)?
            {
                record.annotate(ALREADY_EXISTS);
            }
        }
        Ok(flag_conflicts(records))
    }

    /// Apply a manifest batch for `company`.
    ///
    /// Returns every record, including the ones that could not be applied
    /// (with `error` set). Re-ingesting an unchanged batch changes nothing.
    pub fn ingest(&mut self, records: Vec<Passenger>, company: CompanyId) -> Ingestion {
        let mut out = Ingestion::default();

        let (usable, unusable): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| r.valid && r.pickup_time.is_some());
        out.summary.skipped += unusable.len();
        out.records.extend(unusable);

        let mut to_add = Vec::new();
        let mut to_cancel = Vec::new();
        let mut to_change = Vec::new();

        for record in flag_conflicts(usable) {
            if !record.valid {
                warn!(passenger = %record.full_name(), "double booking in batch");
                out.summary.failed += 1;
                out.records.push(record);
                continue;
            }
            match record.ingestion {
                IngestionStatus::Add => match self.classify_add(&record) {
                    Ok(AddCheck::New) => to_add.push(record),
                    Ok(AddCheck::AlreadyBooked) => {
                        debug!(passenger = %record.full_name(), "already booked");
                        out.summary.skipped += 1;
                        out.records.push(record);
                    }
                    Ok(AddCheck::DoubleBooked) => {
                        let mut record = record;
                        warn!(passenger = %record.full_name(), "already booked elsewhere at this time");
                        record.invalidate(CONFLICT_ERROR);
                        out.summary.failed += 1;
                        out.records.push(record);
                    }
                    Err(e) => out.fail(record, e),
                },
                IngestionStatus::Cancel => match self.cancellable_match(&record) {
                    Ok(true) => to_cancel.push(record),
                    Ok(false) => {
                        debug!(passenger = %record.full_name(), "nothing to cancel");
                        out.summary.skipped += 1;
                        out.records.push(record);
                    }
                    Err(e) => out.fail(record, e),
                },
                IngestionStatus::Change => to_change.push(record),
            }
        }

        self.apply_adds(to_add, company, &mut out);

        let caller = Caller::organizer(company);
        for record in to_cancel {
            match self.cancel_single(&caller, &record) {
                Ok(cancelled) => {
                    out.summary.cancelled += 1;
                    out.records.push(cancelled);
                }
                Err(e) => out.fail(record, e),
            }
        }

        for record in to_change {
            self.apply_change(&caller, record, &mut out);
        }

        info!(
            %company,
            added = out.summary.added,
            cancelled = out.summary.cancelled,
            changed = out.summary.changed,
            skipped = out.summary.skipped,
            failed = out.summary.failed,
            "ingested manifest"
        );
        out
    }

    /// An active booking with the same name, route and time is a repeat of
    /// this add even if its ship or PO number differ; the same name and time
    /// on another route is a double booking.
    fn classify_add(&self, record: &Passenger) -> Result<AddCheck, ReconcileError> {
        if let Some(exact) = PassengerQuery::exact(record)
            && self.store.has_active_passenger(&exact)?
        {
            return Ok(AddCheck::AlreadyBooked);
        }
        if let Some(by_time) = PassengerQuery::name_and_time(record)
            && self.store.has_active_passenger(&by_time)?
        {
            return Ok(AddCheck::DoubleBooked);
        }
        Ok(AddCheck::New)
    }

    fn cancellable_match(&self, record: &Passenger) -> Result<bool, ReconcileError> {
        match PassengerQuery::name_and_time(record) {
            Some(query) => Ok(self.store.find_passenger(&query)?.is_some()),
            None => Ok(false),
        }
    }

    /// Group `add` records into trips.
    ///
    /// Each record not yet placed is matched to a trip; every other pending
    /// record that the trip [carries](Trip::carries) rides along with it.
    fn apply_adds(&mut self, records: Vec<Passenger>, company: CompanyId, out: &mut Ingestion) {
        let mut pending: VecDeque<Passenger> = records.into();

        while let Some(record) = pending.pop_front() {
            let trip = match self.find_or_create_trip(&record, company) {
                Ok(trip) => trip,
                Err(e) => {
                    out.fail(record, e);
                    continue;
                }
            };

            let (riders, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|r| trip.carries(r));
            pending = rest.into();

            for rider in std::iter::once(record).chain(riders) {
                match self.board(rider.clone(), &trip) {
                    Ok(saved) => {
                        out.summary.added += 1;
                        out.records.push(saved);
                    }
                    Err(e) => out.fail(rider, e),
                }
            }
        }
    }

    /// Attach `record` to `trip` and persist it.
    fn board(&mut self, mut record: Passenger, trip: &Trip) -> Result<Passenger, ReconcileError> {
        record.adopt_itinerary(trip);
        record.status = trip.status;
        let saved = self.store.save_passenger(record)?;
        debug!(passenger = %saved.full_name(), trip = ?trip.id, "boarded");
        Ok(saved)
    }

    /// Apply a `change` record to every booking it refers to.
    fn apply_change(&mut self, caller: &Caller, record: Passenger, out: &mut Ingestion) {
        let targets = match self.change_targets(&record) {
            Ok(targets) => targets,
            Err(e) => {
                out.fail(record, e);
                return;
            }
        };

        if targets.is_empty() {
            let mut record = record;
            debug!(passenger = %record.full_name(), "nothing to change");
            record.annotate(NO_SUCH_PASSENGER);
            out.summary.skipped += 1;
            out.records.push(record);
            return;
        }

        for target in targets {
            match self.change_reconcile(caller, target, &record) {
                Ok(changed) => {
                    out.summary.changed += 1;
                    out.records.push(changed);
                }
                Err(e) => out.fail(record.clone(), e),
            }
        }
    }

    /// Existing bookings a change record refers to: the one at the same
    /// time (route changed) and the one on the same route (time changed).
    fn change_targets(&self, record: &Passenger) -> Result<Vec<PassengerId>, ReconcileError> {
        let mut queries = Vec::with_capacity(2);
        if let Some(by_time) = PassengerQuery::name_and_time(record) {
            queries.push(by_time);
        }
        queries.push(PassengerQuery::name_and_route(record));

        let mut targets = Vec::new();
        for query in &queries {
            let found = self
                .store
                .passengers_matching(query)?
                .into_iter()
                .find(|p| !p.is_cancelled())
                .and_then(|p| p.id);
            if let Some(id) = found
                && !targets.contains(&id)
            {
                targets.push(id);
            }
        }
        Ok(targets)
    }

    pub(super) fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }
}

enum AddCheck {
    New,
    AlreadyBooked,
    DoubleBooked,
}

impl Ingestion {
    fn fail(&mut self, mut record: Passenger, error: ReconcileError) {
        warn!(passenger = %record.full_name(), error = %error, "record not applied");
        record.annotate(error.to_string());
        self.summary.failed += 1;
        self.records.push(record);
    }
}

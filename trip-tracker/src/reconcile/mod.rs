//! Manifest reconciliation and trip lifecycle.
//!
//! This module turns batches of extracted passenger records into trips:
//! it flags double bookings, groups bookings with the same itinerary onto
//! one trip, and applies cancellations and changes to earlier bookings.
//! It also hosts the single-booking and whole-trip operations that keep
//! trips consistent after ingestion (cancel, toggle, change, transfer and
//! dispatch).
//!
//! Everything runs synchronously against a [`Store`](crate::store::Store);
//! the current time comes from a [`Clock`].

mod caller;
mod clock;
mod config;
mod conflicts;
mod dispatch;
mod engine;
mod error;
mod lifecycle;
mod matcher;


pub use caller::{Caller, Role};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ReconcileConfig;
pub use conflicts::{CONFLICT_ERROR, flag_conflicts};
pub use engine::{ALREADY_EXISTS, IngestSummary, Ingestion, NO_SUCH_PASSENGER, Reconciler};
pub use error::{ErrorKind, ReconcileError};
pub use lifecycle::VacatedTrip;
pub use matcher::ManualTripOrder;

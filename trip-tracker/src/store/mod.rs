//! Persistence for trips, passengers and reference data.
//!
//! The reconciliation core is written against the [`Store`] trait. The
//! [`MemoryStore`] arena backs tests and the command-line tool, and can be
//! persisted as a JSON [`Snapshot`] through a [`SnapshotFile`].

mod error;
mod memory;
mod repository;
mod snapshot;

pub use error::StoreError;
pub use memory::{MemoryStore, Snapshot};
pub use repository::{
    CompanyQuery, Criteria, Entity, LocationQuery, PassengerQuery, Repository, ShipQuery, Store,
    TripQuery,
};
pub use snapshot::SnapshotFile;

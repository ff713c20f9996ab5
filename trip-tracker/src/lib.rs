//! Passenger transport tracker.
//!
//! Reconciles cruise-ship passenger manifests into shared vehicle trips:
//! "these people need picking up from this pier at this time, which car
//! do they ride in?"

pub mod domain;
pub mod locations;
pub mod manifest;
pub mod reconcile;
pub mod store;

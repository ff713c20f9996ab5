//! Canonicalising free-text place names.
//!
//! Manifests name pickup points, destinations and harbours as free text.
//! A [`LocationResolver`] turns that text into a [`Location`] with
//! coordinates and a dispatch region, when those are known.

mod cache;
mod error;
mod gazetteer;

pub use cache::{CacheConfig, CachedResolver};
pub use error::LocationError;
pub use gazetteer::{Gazetteer, PlaceEntry, PlacesFile};

use crate::domain::Location;

/// Resolves free-text place names to canonical locations.
///
/// Resolution must be idempotent: the same name always yields the same
/// location.
pub trait LocationResolver {
    fn resolve(&self, name: &str) -> Result<Location, LocationError>;
}

impl<R: LocationResolver + ?Sized> LocationResolver for &R {
    fn resolve(&self, name: &str) -> Result<Location, LocationError> {
        (**self).resolve(name)
    }
}

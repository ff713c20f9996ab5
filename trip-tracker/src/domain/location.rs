//! Places, coordinates and dispatch regions.

use serde::{Deserialize, Serialize};

use super::{LocationId, RegionId};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Normalise a free-text place name for matching: trimmed and lowercased.
///
/// ```
/// use trip_tracker::domain::normalize_place;
///
/// assert_eq!(normalize_place("  Pier A "), "pier a");
/// ```
pub fn normalize_place(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat_a = self.latitude.to_radians();
        let lat_b = other.latitude.to_radians();
        let d_lat = lat_b - lat_a;
        let d_long = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_long / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// A canonical place: pickup point, destination or harbour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Option<LocationId>,
    /// Normalised name (see [`normalize_place`]).
    pub name: String,
    /// Coordinates, if the place could be geocoded.
    pub coordinates: Option<Coordinates>,
    /// Dispatch region the place falls in, if known.
    pub region: Option<RegionId>,
}

impl Location {
    /// A location known only by name.
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: normalize_place(name),
            coordinates: None,
            region: None,
        }
    }

    /// Whether `name` refers to this place (case-insensitive).
    pub fn is_named(&self, name: &str) -> bool {
        self.name == normalize_place(name)
    }
}

/// A dispatch region, served by one or more dispatcher companies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub center: Coordinates,
}

//! Offline place lookup.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Coordinates, Location, LocationId, Region, RegionId, normalize_place};

use super::LocationResolver;
use super::error::LocationError;

/// A named place with coordinates, as listed in a places file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// On-disk list of regions and known places.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacesFile {
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub places: Vec<PlaceEntry>,
}

#[derive(Debug, Clone)]
struct Place {
    id: Option<LocationId>,
    coordinates: Option<Coordinates>,
    region: Option<RegionId>,
}

/// Resolver over a fixed set of known places and dispatch regions.
///
/// Known places resolve with their coordinates and the region whose centre
/// is nearest. Unknown names still resolve, to a location without
/// coordinates or region.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<String, Place>,
    regions: Vec<Region>,
}

impl Gazetteer {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            places: HashMap::new(),
            regions,
        }
    }

    /// Build a gazetteer from a places file.
    pub fn from_places(file: PlacesFile) -> Self {
        let mut gazetteer = Self::new(file.regions);
        for place in file.places {
            gazetteer.add_place(&place.name, Coordinates::new(place.latitude, place.longitude));
        }
        gazetteer
    }

    /// Read a JSON places file.
    pub fn load(path: &Path) -> Result<Self, LocationError> {
        let contents = std::fs::read_to_string(path).map_err(|e| LocationError::Places {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let file: PlacesFile = serde_json::from_str(&contents).map_err(|e| LocationError::Places {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;
        Ok(Self::from_places(file))
    }

    /// Add a place with coordinates.
    pub fn add_place(&mut self, name: &str, coordinates: Coordinates) {
        self.places.insert(
            normalize_place(name),
            Place {
                id: None,
                coordinates: Some(coordinates),
                region: None,
            },
        );
    }

    /// Builder form of [`Gazetteer::add_place`].
    pub fn with_place(mut self, name: &str, coordinates: Coordinates) -> Self {
        self.add_place(name, coordinates);
        self
    }

    /// Learn previously stored locations, keeping their ids and regions.
    ///
    /// Places already known with coordinates are not overwritten by stored
    /// locations that lack them.
    pub fn learn(&mut self, locations: &[Location]) {
        for location in locations {
            let entry = self.places.entry(normalize_place(&location.name)).or_insert(Place {
                id: None,
                coordinates: None,
                region: None,
            });
            entry.id = location.id.or(entry.id);
            entry.coordinates = location.coordinates.or(entry.coordinates);
            entry.region = location.region.or(entry.region);
        }
    }

    /// The region whose centre is closest to `point`.
    pub fn nearest_region(&self, point: &Coordinates) -> Option<&Region> {
        self.regions.iter().min_by(|a, b| {
            a.center
                .distance_km(point)
                .total_cmp(&b.center.distance_km(point))
        })
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl LocationResolver for Gazetteer {
    fn resolve(&self, name: &str) -> Result<Location, LocationError> {
        let key = normalize_place(name);
        if key.is_empty() {
            return Err(LocationError::EmptyName);
        }

        let mut location = Location::named(&key);
        let Some(place) = self.places.get(&key) else {
            debug!(place = %key, "unknown place, resolving without coordinates");
            return Ok(location);
        };

        location.id = place.id;
        location.coordinates = place.coordinates;
        location.region = place.region.or_else(|| {
            place
                .coordinates
                .and_then(|c| self.nearest_region(&c))
                .map(|r| r.id)
        });
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn regions() -> Vec<Region> {
        vec![
            Region {
                id: RegionId(1),
                name: "Rogaland".into(),
                center: Coordinates::new(58.97, 5.73),
            },
            Region {
                id: RegionId(2),
                name: "Vestland".into(),
                center: Coordinates::new(60.39, 5.32),
            },
        ]
    }

    #[test]
    fn known_place_gets_nearest_region() {
        let gazetteer =
            Gazetteer::new(regions()).with_place("Bergen Cruise Terminal", Coordinates::new(60.40, 5.31));

        let loc = gazetteer.resolve("  BERGEN cruise terminal ").unwrap();
        assert_eq!(loc.name, "bergen cruise terminal");
        assert_eq!(loc.region, Some(RegionId(2)));
        assert!(loc.coordinates.is_some());
    }

    #[test]
    fn unknown_place_resolves_without_region() {
        let gazetteer = Gazetteer::new(regions());
        let loc = gazetteer.resolve("Somewhere").unwrap();
        assert_eq!(loc.name, "somewhere");
        assert_eq!(loc.coordinates, None);
        assert_eq!(loc.region, None);
    }

    #[test]
    fn empty_name_is_rejected() {
        let gazetteer = Gazetteer::default();
        assert!(matches!(gazetteer.resolve("   "), Err(LocationError::EmptyName)));
    }

    #[test]
    fn resolution_is_idempotent() {
        let gazetteer = Gazetteer::new(regions()).with_place("Pier A", Coordinates::new(58.9, 5.7));
        assert_eq!(gazetteer.resolve("Pier A").unwrap(), gazetteer.resolve("pier a").unwrap());
    }

    #[test]
    fn learned_locations_keep_id_and_region() {
        let mut gazetteer = Gazetteer::new(regions());
        let mut stored = Location::named("Airport");
        stored.id = Some(LocationId(5));
        stored.region = Some(RegionId(1));
        gazetteer.learn(&[stored]);

        let loc = gazetteer.resolve("airport").unwrap();
        assert_eq!(loc.id, Some(LocationId(5)));
        assert_eq!(loc.region, Some(RegionId(1)));
    }

    #[test]
    fn load_places_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("places.json");
        std::fs::write(
            &path,
            r#"{
                "regions": [{"id": 1, "name": "Rogaland", "center": {"latitude": 58.97, "longitude": 5.73}}],
                "places": [{"name": "Stavanger Harbour", "latitude": 58.97, "longitude": 5.73}]
            }"#,
        )
        .unwrap();

        let gazetteer = Gazetteer::load(&path).unwrap();
        assert_eq!(gazetteer.len(), 1);
        assert_eq!(gazetteer.resolve("stavanger harbour").unwrap().region, Some(RegionId(1)));
    }

    #[test]
    fn corrupt_places_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("places.json");
        std::fs::write(&path, "[").unwrap();
        assert!(matches!(Gazetteer::load(&path), Err(LocationError::Places { .. })));
    }
}

//! In-memory arena store.
//!
//! Every entity type lives in its own id-keyed table. Passengers point at
//! their trip by id, so there are no ownership cycles between the tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Location, OrganizerCompany, Passenger, Ship, Trip};

use super::error::StoreError;
use super::repository::{Criteria, Entity, Repository};

/// One id-keyed table of entities.
#[derive(Debug, Clone)]
struct Table<T: Entity> {
    rows: BTreeMap<T::Id, T>,
    /// Highest id handed out or seen so far.
    last_id: u64,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Entity> Table<T> {
    fn from_rows(rows: Vec<T>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.insert(row);
        }
        table
    }

    fn get(&self, id: T::Id) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn matching(&self, criteria: &dyn Criteria<T>) -> Vec<T> {
        self.rows
            .values()
            .filter(|row| criteria.matches(row))
            .cloned()
            .collect()
    }

    fn insert(&mut self, mut entity: T) -> T {
        let id = match entity.id() {
            Some(id) => {
                self.last_id = self.last_id.max(id.into());
                id
            }
            None => {
                self.last_id += 1;
                let id = T::Id::from(self.last_id);
                entity.set_id(id);
                id
            }
        };
        self.rows.insert(id, entity.clone());
        entity
    }

    fn remove(&mut self, id: T::Id) -> Result<(), StoreError> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(T::KIND, id))
    }

    fn rows(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub companies: Vec<OrganizerCompany>,
    #[serde(default)]
    pub ships: Vec<Ship>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
}

/// Arena store holding every entity in memory.
///
/// Saving a `created` trip whose grouping key is already used by another
/// `created` trip fails with [`StoreError::DuplicateOpenTrip`], so two
/// ingestions racing on the same itinerary cannot both open a trip.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    companies: Table<OrganizerCompany>,
    ships: Table<Ship>,
    locations: Table<Location>,
    trips: Table<Trip>,
    passengers: Table<Passenger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot, keeping every id.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            companies: Table::from_rows(snapshot.companies),
            ships: Table::from_rows(snapshot.ships),
            locations: Table::from_rows(snapshot.locations),
            trips: Table::from_rows(snapshot.trips),
            passengers: Table::from_rows(snapshot.passengers),
        }
    }

    /// Copy the current contents into a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            companies: self.companies.rows(),
            ships: self.ships.rows(),
            locations: self.locations.rows(),
            trips: self.trips.rows(),
            passengers: self.passengers.rows(),
        }
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }
}

impl Repository<Trip> for MemoryStore {
    fn find_by_id(&self, id: <Trip as Entity>::Id) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.get(id))
    }

    fn find_matching(&self, criteria: &dyn Criteria<Trip>) -> Result<Vec<Trip>, StoreError> {
        Ok(self.trips.matching(criteria))
    }

    fn save(&mut self, trip: Trip) -> Result<Trip, StoreError> {
        if trip.is_open() {
            let key = trip.grouping_key();
            let clash = self
                .trips
                .rows
                .values()
                .any(|other| other.id != trip.id && other.is_open() && other.grouping_key() == key);
            if clash {
                warn!(%key, "refusing to open a second trip for the same grouping key");
                return Err(StoreError::DuplicateOpenTrip(key));
            }
        }
        Ok(self.trips.insert(trip))
    }

    fn delete(&mut self, id: <Trip as Entity>::Id) -> Result<(), StoreError> {
        self.trips.remove(id)
    }
}

macro_rules! plain_repository {
    ($ty:ty, $field:ident) => {
        impl Repository<$ty> for MemoryStore {
            fn find_by_id(&self, id: <$ty as Entity>::Id) -> Result<Option<$ty>, StoreError> {
                Ok(self.$field.get(id))
            }

            fn find_matching(&self, criteria: &dyn Criteria<$ty>) -> Result<Vec<$ty>, StoreError> {
                Ok(self.$field.matching(criteria))
            }

            fn save(&mut self, entity: $ty) -> Result<$ty, StoreError> {
                Ok(self.$field.insert(entity))
            }

            fn delete(&mut self, id: <$ty as Entity>::Id) -> Result<(), StoreError> {
                self.$field.remove(id)
            }
        }
    };
}

plain_repository!(Passenger, passengers);
plain_repository!(Ship, ships);
plain_repository!(OrganizerCompany, companies);
plain_repository!(Location, locations);

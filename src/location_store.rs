use log::{debug, info, warn};
use crate::errors::StoreError;
use crate::forecast_key::ForecastKey;
use crate::models::forecast_io::DailyForecast;
use crate::models::location::Location;
use crate::storage::Storage;

/// Ordered collection of locations, persisted as a whole after every change.
///
/// The index of a location is its public handle. Removing a location shifts every later
/// location down by one, so indexes must not be kept across a remove.
pub struct LocationStore<S: Storage> {
    locations: Vec<Location>,
    storage: S,
    storage_key: String,
}

impl<S: Storage> LocationStore<S> {
    /// Returns an empty store
    ///
    /// # Arguments
    ///
    /// * 'storage' - persistent storage to save the store to
    /// * 'storage_key' - the key the store is saved under
    pub fn new(storage: S, storage_key: &str) -> LocationStore<S> {
        Self { locations: Vec::new(), storage, storage_key: storage_key.to_string() }
    }

    /// Returns a store initialised with whatever was previously saved under the storage key
    ///
    /// # Arguments
    ///
    /// * 'storage' - persistent storage to restore from and later save to
    /// * 'storage_key' - the key the store is saved under
    pub fn restore(storage: S, storage_key: &str) -> Result<LocationStore<S>, StoreError> {
        let mut store = LocationStore::new(storage, storage_key);

        if let Some(blob) = store.storage.get(storage_key)? {
            store.deserialize(&blob)?;
            info!("restored {} locations from '{}'", store.len(), storage_key);
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns the location at the given index
    ///
    /// # Arguments
    ///
    /// * 'index' - index of the location, starting at zero
    pub fn at(&self, index: usize) -> Result<&Location, StoreError> {
        self.locations.get(index).ok_or(StoreError::Index { index, size: self.locations.len() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Adds a location unless one with the exact same coordinates is already stored, in which
    /// case the index of that one is returned and nothing changes, not even its nickname.
    ///
    /// Coordinates must be finite, latitude within -90..=90 and longitude within -180..=180.
    /// If saving fails the location is still added in memory and the error is returned.
    ///
    /// # Arguments
    ///
    /// * 'latitude' - latitude of the location
    /// * 'longitude' - longitude of the location
    /// * 'nickname' - user label for the location
    pub fn add(&mut self, latitude: f64, longitude: f64, nickname: &str) -> Result<usize, StoreError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(StoreError::Coordinates { latitude, longitude });
        }

        if let Some(index) = self.index_for_location(latitude, longitude) {
            debug!("location {},{} already stored at {}", latitude, longitude, index);
            return Ok(index);
        }

        self.locations.push(Location::new(latitude, longitude, nickname));
        self.persist()?;

        Ok(self.locations.len() - 1)
    }

    /// Removes the location at the given index
    ///
    /// # Arguments
    ///
    /// * 'index' - index of the location to remove
    pub fn remove_at(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.locations.len() {
            return Err(StoreError::Index { index, size: self.locations.len() });
        }

        let removed = self.locations.remove(index);
        debug!("removed location '{}' at {}", removed.nickname, index);

        self.persist()
    }

    pub fn remove_all(&mut self) -> Result<(), StoreError> {
        self.locations.clear();
        self.persist()
    }

    /// Returns the index of the location with exactly the given coordinates, if any
    pub fn index_for_location(&self, latitude: f64, longitude: f64) -> Option<usize> {
        self.locations.iter().position(|l| l.is_at(latitude, longitude))
    }

    /// Returns the index of the first location with the given nickname, if any
    pub fn index_for_nickname(&self, nickname: &str) -> Option<usize> {
        self.locations.iter().position(|l| l.nickname == nickname)
    }

    /// Stores a forecast for a location and saves the store
    ///
    /// # Arguments
    ///
    /// * 'index' - index of the location
    /// * 'key' - the key to store the forecast under
    /// * 'forecast' - the forecast to store
    pub fn insert_forecast(&mut self, index: usize, key: ForecastKey, forecast: DailyForecast) -> Result<(), StoreError> {
        let size = self.locations.len();
        let location = self.locations.get_mut(index).ok_or(StoreError::Index { index, size })?;

        location.forecasts.insert(key, forecast);

        self.persist()
    }

    /// Encodes every location, including its forecasts, in current order
    pub fn serialize(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.locations)?)
    }

    /// Appends every location encoded in the blob, in encoded order.
    /// Meant to be called once, directly after construction.
    ///
    /// # Arguments
    ///
    /// * 'blob' - a blob previously produced by serialize
    pub fn deserialize(&mut self, blob: &str) -> Result<(), StoreError> {
        let locations: Vec<Location> = serde_json::from_str(blob)?;
        self.locations.extend(locations);

        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let blob = self.serialize()?;

        self.storage.set(&self.storage_key, &blob).map_err(|e| {
            warn!("failed to save locations, in memory state kept: {}", e);
            StoreError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{Map, Number, Value};
    use crate::storage::MemoryStorage;

    const KEY: &str = "weatherApp-locations";

    fn forecast(time: i64, icon: &str) -> DailyForecast {
        let mut extra = Map::new();
        extra.insert("humidity".to_string(), Value::from(0.5));
        DailyForecast {
            time,
            summary: Some("Clear".to_string()),
            icon: Some(icon.to_string()),
            temperature_min: Number::from_f64(-2.5),
            temperature_max: Some(Number::from(8)),
            extra,
        }
    }

    #[test]
    fn add_is_idempotent_by_coordinates() {
        let storage = MemoryStorage::default();
        let mut store = LocationStore::new(storage.clone(), KEY);

        let first = store.add(37.8267, -122.423, "Home").unwrap();
        let second = store.add(37.8267, -122.423, "Work").unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.at(0).unwrap().nickname, "Home");
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn add_appends_new_coordinates() {
        let mut store = LocationStore::new(MemoryStorage::default(), KEY);

        assert_eq!(store.add(1.0, 2.0, "a").unwrap(), 0);
        assert_eq!(store.add(1.0, 2.5, "b").unwrap(), 1);
        assert_eq!(store.add(2.0, 1.0, "c").unwrap(), 2);
        assert_eq!(store.index_for_location(2.0, 1.0), Some(2));
        assert_eq!(store.index_for_location(2.0, 2.0), None);
    }

    #[test]
    fn remove_at_shifts_and_invalidates() {
        let mut store = LocationStore::new(MemoryStorage::default(), KEY);
        store.add(1.0, 1.0, "a").unwrap();
        store.add(2.0, 2.0, "b").unwrap();
        store.add(3.0, 3.0, "c").unwrap();

        store.remove_at(0).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.at(0).unwrap().nickname, "b");
        assert_eq!(store.at(1).unwrap().nickname, "c");
        assert!(matches!(store.remove_at(2), Err(StoreError::Index { index: 2, size: 2 })));
    }

    #[test]
    fn remove_only_location_empties_store() {
        let mut store = LocationStore::new(MemoryStorage::default(), KEY);
        store.add(37.8267, -122.423, "Home").unwrap();

        store.remove_at(0).unwrap();

        assert_eq!(store.len(), 0);
        assert!(matches!(store.at(0), Err(StoreError::Index { index: 0, size: 0 })));
    }

    #[test]
    fn remove_all_persists_empty_store() {
        let storage = MemoryStorage::default();
        let mut store = LocationStore::new(storage.clone(), KEY);
        store.add(1.0, 1.0, "a").unwrap();
        store.add(2.0, 2.0, "b").unwrap();

        store.remove_all().unwrap();

        assert!(store.is_empty());
        assert_eq!(storage.get(KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn index_for_nickname_returns_first_match() {
        let mut store = LocationStore::new(MemoryStorage::default(), KEY);
        store.add(1.0, 1.0, "Cabin").unwrap();
        store.add(2.0, 2.0, "Home").unwrap();
        store.add(3.0, 3.0, "Home").unwrap();

        assert_eq!(store.index_for_nickname("Home"), Some(1));
        assert_eq!(store.index_for_nickname("Office"), None);
    }

    #[test]
    fn serialize_round_trips_into_empty_store() {
        let mut store = LocationStore::new(MemoryStorage::default(), KEY);
        store.add(-37.8136, 144.9631, "Melbourne").unwrap();
        store.add(51.5072, -0.1276, "London").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        store.insert_forecast(1, ForecastKey::new(51.5072, -0.1276, day), forecast(1709251200, "rain")).unwrap();

        let blob = store.serialize().unwrap();
        let mut copy = LocationStore::new(MemoryStorage::default(), KEY);
        copy.deserialize(&blob).unwrap();

        assert_eq!(copy.len(), 2);
        for (a, b) in store.iter().zip(copy.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn deserialize_appends() {
        let mut source = LocationStore::new(MemoryStorage::default(), KEY);
        source.add(5.0, 5.0, "restored").unwrap();
        let blob = source.serialize().unwrap();

        let mut store = LocationStore::new(MemoryStorage::default(), KEY);
        store.add(1.0, 1.0, "existing").unwrap();
        store.deserialize(&blob).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.at(0).unwrap().nickname, "existing");
        assert_eq!(store.at(1).unwrap().nickname, "restored");
    }

    #[test]
    fn restore_reads_previous_session() {
        let storage = MemoryStorage::default();
        {
            let mut store = LocationStore::new(storage.clone(), KEY);
            store.add(1.0, 1.0, "a").unwrap();
            store.add(2.0, 2.0, "b").unwrap();
        }

        let store = LocationStore::restore(storage, KEY).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.at(1).unwrap().nickname, "b");
    }

    #[test]
    fn restore_without_saved_state_is_empty() {
        let store = LocationStore::restore(MemoryStorage::default(), KEY).unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn restore_rejects_corrupt_blob() {
        let mut storage = MemoryStorage::default();
        storage.set(KEY, "{not a list").unwrap();

        assert!(matches!(LocationStore::restore(storage, KEY), Err(StoreError::Document(_))));
    }

    #[test]
    fn add_rejects_coordinates_that_cannot_be_saved() {
        let storage = MemoryStorage::default();
        let mut store = LocationStore::new(storage.clone(), KEY);
        store.add(1.0, 1.0, "a").unwrap();
        let saved = storage.get(KEY).unwrap();

        let invalid = [
            (f64::NAN, 1.0),
            (1.0, f64::NAN),
            (f64::INFINITY, 1.0),
            (1.0, f64::NEG_INFINITY),
            (90.5, 1.0),
            (1.0, -180.5),
        ];
        for (latitude, longitude) in invalid {
            assert!(matches!(store.add(latitude, longitude, "x"), Err(StoreError::Coordinates { .. })));
        }

        assert_eq!(store.len(), 1);
        assert_eq!(storage.get(KEY).unwrap(), saved);
        assert_eq!(LocationStore::restore(storage, KEY).unwrap().len(), 1);
    }

    #[test]
    fn add_accepts_coordinate_bounds() {
        let mut store = LocationStore::new(MemoryStorage::default(), KEY);

        assert_eq!(store.add(90.0, 180.0, "corner").unwrap(), 0);
        assert_eq!(store.add(-90.0, -180.0, "other corner").unwrap(), 1);
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let storage = MemoryStorage::default();
        let mut store = LocationStore::new(storage.clone(), KEY);
        storage.fail_writes(true);

        assert!(matches!(store.add(1.0, 1.0, "a"), Err(StoreError::Persistence(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.index_for_location(1.0, 1.0), Some(0));

        storage.fail_writes(false);
        store.add(2.0, 2.0, "b").unwrap();
        let saved = LocationStore::restore(storage, KEY).unwrap();
        assert_eq!(saved.len(), 2);
    }
}

use std::collections::HashMap;
use chrono::NaiveDate;
use log::{debug, info, warn};
use crate::errors::{CacheError, FetchError};
use crate::forecast_key::{forecast_date_string, ForecastKey};
use crate::location_store::LocationStore;
use crate::models::forecast_io::{DailyForecast, ForecastPayload};
use crate::storage::Storage;

/// Called with the location index and the forecast once the forecast is available
pub type ForecastCallback = Box<dyn FnOnce(usize, &DailyForecast)>;

/// An outbound forecast request, tagged with the key its response will resolve to
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub key: ForecastKey,
    pub latitude: f64,
    pub longitude: f64,
    pub date_string: String,
}

/// Issues forecast requests.
///
/// Implementations must return as soon as the request is on its way. The response is handed
/// back later, by whoever drives the cache, through [ForecastCache::on_response].
pub trait Fetcher {
    fn fetch(&mut self, request: ForecastRequest) -> Result<(), FetchError>;
}

/// Resolves forecasts for stored locations, from the locations' own forecast maps when
/// possible and from the fetcher otherwise.
///
/// Only one callback is kept per forecast key. A second request for a key whose fetch is
/// still outstanding replaces the first callback, and only the replacement is called when
/// the response arrives.
pub struct ForecastCache<S: Storage, F: Fetcher> {
    store: LocationStore<S>,
    fetcher: F,
    pending: HashMap<ForecastKey, ForecastCallback>,
}

impl<S: Storage, F: Fetcher> ForecastCache<S, F> {
    pub fn new(store: LocationStore<S>, fetcher: F) -> ForecastCache<S, F> {
        Self { store, fetcher, pending: HashMap::new() }
    }

    pub fn locations(&self) -> &LocationStore<S> {
        &self.store
    }

    pub fn locations_mut(&mut self) -> &mut LocationStore<S> {
        &mut self.store
    }

    /// Requests the forecast for a stored location and a calendar day.
    ///
    /// If the forecast is already cached the callback is called before this function returns
    /// and no fetch is made. Otherwise a fetch is issued and the callback is called from
    /// [ForecastCache::on_response] when the forecast arrives.
    ///
    /// # Arguments
    ///
    /// * 'index' - index of the location in the store
    /// * 'date' - the calendar day, in local time
    /// * 'on_complete' - callback receiving the location index and the forecast
    pub fn request_forecast<C>(&mut self, index: usize, date: NaiveDate, on_complete: C) -> Result<(), CacheError>
    where C: FnOnce(usize, &DailyForecast) + 'static {
        self.request(index, date, Box::new(on_complete), false)
    }

    /// Same as request_forecast but always fetches, even if the forecast is cached.
    /// The fetched forecast replaces the cached one.
    ///
    /// # Arguments
    ///
    /// * 'index' - index of the location in the store
    /// * 'date' - the calendar day, in local time
    /// * 'on_complete' - callback receiving the location index and the forecast
    pub fn refresh_forecast<C>(&mut self, index: usize, date: NaiveDate, on_complete: C) -> Result<(), CacheError>
    where C: FnOnce(usize, &DailyForecast) + 'static {
        self.request(index, date, Box::new(on_complete), true)
    }

    fn request(&mut self, index: usize, date: NaiveDate, on_complete: ForecastCallback, bypass: bool) -> Result<(), CacheError> {
        let location = self.store.at(index)?;
        let key = ForecastKey::new(location.latitude, location.longitude, date);

        if !bypass {
            if let Some(forecast) = location.forecasts.get(&key) {
                if self.pending.remove(&key).is_some() {
                    debug!("cached forecast {} consumes an earlier pending callback", key);
                }
                debug!("forecast {} served from cache", key);
                on_complete(index, forecast);
                return Ok(());
            }
        }

        let request = ForecastRequest {
            key: key.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            date_string: forecast_date_string(date),
        };

        if self.pending.insert(key.clone(), on_complete).is_some() {
            warn!("forecast {} requested again before response, earlier callback dropped", key);
        }

        if let Err(e) = self.fetcher.fetch(request) {
            self.pending.remove(&key);
            return Err(CacheError::from(e));
        }
        debug!("forecast {} fetch issued", key);

        Ok(())
    }

    /// Takes care of a response from the forecast provider.
    ///
    /// The forecast is stored with the location it belongs to and the store is saved before
    /// the callback registered for the forecast key is called. Returns the index of the
    /// location the forecast was stored for.
    ///
    /// The key is built from the stored location's coordinates, not the payload's, so that it
    /// is the exact key the request was made with. A save failure does not stop the callback
    /// from being called, it is reported after. Without a pending callback a save failure is
    /// reported ahead of the missing callback.
    ///
    /// # Arguments
    ///
    /// * 'json' - the response body
    pub fn on_response(&mut self, json: &str) -> Result<usize, CacheError> {
        let payload = ForecastPayload::decode(json)?;
        let date = payload.date()?;

        let index = self.store
            .index_for_location(payload.latitude, payload.longitude)
            .ok_or(CacheError::UnknownLocation { latitude: payload.latitude, longitude: payload.longitude })?;
        let location = self.store.at(index)?;
        let key = ForecastKey::new(location.latitude, location.longitude, date);

        let persisted = self.store.insert_forecast(index, key.clone(), payload.first_day.clone());
        info!("forecast {} stored for location {}", key, index);

        let Some(callback) = self.pending.remove(&key) else {
            persisted?;
            return Err(CacheError::NoPendingCallback(key));
        };
        callback(index, &payload.first_day);

        persisted?;
        Ok(index)
    }

    /// Drops the pending callback for a key, used when its fetch is known to have failed.
    /// Returns true if there was a callback to drop.
    pub fn cancel(&mut self, key: &ForecastKey) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &ForecastKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

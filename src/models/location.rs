use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::forecast_key::ForecastKey;
use crate::models::forecast_io::DailyForecast;

/// A stored geographic point with its user label and its own forecast cache
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub nickname: String,
    pub latitude: f64,
    pub longitude: f64,
    pub forecasts: BTreeMap<ForecastKey, DailyForecast>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, nickname: &str) -> Location {
        Location {
            nickname: nickname.to_string(),
            latitude,
            longitude,
            forecasts: BTreeMap::new(),
        }
    }

    /// Identity of a location is its exact coordinates, the nickname does not count
    pub fn is_at(&self, latitude: f64, longitude: f64) -> bool {
        self.latitude == latitude && self.longitude == longitude
    }
}

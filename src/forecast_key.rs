use std::fmt;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identity of "this location, this calendar day" in the forecast cache.
///
/// The key is rendered as `latitude,longitude,YYYY-MM-DDT12:00:00`. The date part is always
/// pinned to midday so that no time zone conversion on either side of a request can move it
/// to a neighbouring day.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ForecastKey(String);

impl ForecastKey {
    /// Builds the key for a location and a calendar day
    ///
    /// # Arguments
    ///
    /// * 'latitude' - latitude of the location
    /// * 'longitude' - longitude of the location
    /// * 'date' - the calendar day
    pub fn new(latitude: f64, longitude: f64, date: NaiveDate) -> ForecastKey {
        ForecastKey(format!("{},{},{}", latitude, longitude, forecast_date_string(date)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ForecastKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the date in the format the forecast provider expects, always at midday
///
/// # Arguments
///
/// * 'date' - the calendar day
pub fn forecast_date_string(date: NaiveDate) -> String {
    format!("{}T12:00:00", date.format("%Y-%m-%d"))
}

/// Resolves which calendar day a provider day record belongs to.
///
/// The provider reports a day as the epoch second of its local midnight. When the payload
/// carries the UTC offset of the location that offset is used, so the day is the one at the
/// location. Otherwise the time is read in the local time zone of this machine.
///
/// # Arguments
///
/// * 'time' - epoch seconds of the day record
/// * 'offset_hours' - UTC offset of the location in hours, if known
pub fn normalized_date(time: i64, offset_hours: Option<f64>) -> Option<NaiveDate> {
    match offset_hours {
        Some(offset) => {
            let shifted = time + (offset * 3600.0).round() as i64;
            DateTime::<Utc>::from_timestamp(shifted, 0).map(|d| d.date_naive())
        }
        None => Local.timestamp_opt(time, 0).earliest().map(|d| d.date_naive()),
    }
}

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use serde_json::{Map, Number, Value};
use crate::errors::CacheError;
use crate::forecast_key::normalized_date;

/// One day of forecast as reported by the provider.
///
/// Only the fields used for presentation are named, everything else the provider sends is kept
/// in `extra`. Temperatures stay json numbers so that `5` is saved as `5` and not `5.0`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DailyForecast {
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "temperatureMin", default, skip_serializing_if = "Option::is_none")]
    pub temperature_min: Option<Number>,
    #[serde(rename = "temperatureMax", default, skip_serializing_if = "Option::is_none")]
    pub temperature_max: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DailyForecast {
    pub fn min_temperature(&self) -> Option<f64> {
        self.temperature_min.as_ref().and_then(|t| t.as_f64())
    }

    pub fn max_temperature(&self) -> Option<f64> {
        self.temperature_max.as_ref().and_then(|t| t.as_f64())
    }
}

#[derive(Deserialize)]
struct RawDaily {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Deserialize)]
struct RawForecast {
    latitude: Option<f64>,
    longitude: Option<f64>,
    offset: Option<f64>,
    daily: Option<RawDaily>,
}

/// A validated provider response, reduced to what the cache needs
#[derive(Debug, Clone)]
pub struct ForecastPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub offset: Option<f64>,
    pub first_day: DailyForecast,
}

impl ForecastPayload {
    /// Decodes a raw provider response and checks that every field needed for key derivation
    /// is present.
    ///
    /// # Arguments
    ///
    /// * 'json' - the response body
    pub fn decode(json: &str) -> Result<ForecastPayload, CacheError> {
        let raw: RawForecast = serde_json::from_str(json)
            .map_err(|e| CacheError::MalformedPayload(e.to_string()))?;

        let latitude = raw.latitude
            .ok_or(CacheError::MalformedPayload("missing latitude".to_string()))?;
        let longitude = raw.longitude
            .ok_or(CacheError::MalformedPayload("missing longitude".to_string()))?;
        let first = raw.daily
            .and_then(|d| d.data.into_iter().next())
            .ok_or(CacheError::MalformedPayload("missing daily.data[0]".to_string()))?;

        if !first.get("time").is_some_and(|t| t.is_i64()) {
            return Err(CacheError::MalformedPayload("missing or non integer daily.data[0].time".to_string()));
        }
        let first_day: DailyForecast = serde_json::from_value(first)
            .map_err(|e| CacheError::MalformedPayload(e.to_string()))?;

        Ok(ForecastPayload { latitude, longitude, offset: raw.offset, first_day })
    }

    /// Returns the calendar day the forecast is for
    pub fn date(&self) -> Result<NaiveDate, CacheError> {
        normalized_date(self.first_day.time, self.offset)
            .ok_or(CacheError::MalformedPayload(format!("time out of range: {}", self.first_day.time)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "latitude": 37.8267,
        "longitude": -122.423,
        "timezone": "America/Los_Angeles",
        "offset": -8,
        "daily": {
            "summary": "Rain on Friday",
            "icon": "rain",
            "data": [{
                "time": 1709280000,
                "summary": "Mostly cloudy throughout the day.",
                "icon": "cloudy",
                "temperatureMin": 5,
                "temperatureMax": 12.5,
                "humidity": 0.81,
                "windSpeed": 3.2
            }]
        }
    }"#;

    #[test]
    fn decode_keeps_unknown_fields() {
        let payload = ForecastPayload::decode(SAMPLE).unwrap();

        assert_eq!(payload.latitude, 37.8267);
        assert_eq!(payload.longitude, -122.423);
        assert_eq!(payload.first_day.icon.as_deref(), Some("cloudy"));
        assert_eq!(payload.first_day.min_temperature(), Some(5.0));
        assert_eq!(payload.first_day.max_temperature(), Some(12.5));
        assert_eq!(payload.first_day.extra.get("humidity"), Some(&Value::from(0.81)));
        assert_eq!(payload.first_day.extra.len(), 2);
    }

    #[test]
    fn date_follows_location_calendar_day() {
        // 1709280000 is 2024-03-01 00:00 at UTC-8
        let payload = ForecastPayload::decode(SAMPLE).unwrap();

        assert_eq!(payload.date().unwrap(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn integer_temperatures_are_saved_as_sent() {
        let payload = ForecastPayload::decode(SAMPLE).unwrap();
        let json = serde_json::to_string(&payload.first_day).unwrap();

        assert!(json.contains(r#""temperatureMin":5,"#), "{}", json);
        assert!(json.contains(r#""temperatureMax":12.5"#), "{}", json);
    }

    #[test]
    fn record_round_trips_through_json() {
        let payload = ForecastPayload::decode(SAMPLE).unwrap();
        let json = serde_json::to_string(&payload.first_day).unwrap();
        let back: DailyForecast = serde_json::from_str(&json).unwrap();

        assert_eq!(back, payload.first_day);
    }

    #[test]
    fn missing_fields_are_malformed() {
        let cases = [
            "not json",
            r#"{"longitude": 1.0, "daily": {"data": [{"time": 0}]}}"#,
            r#"{"latitude": 1.0, "daily": {"data": [{"time": 0}]}}"#,
            r#"{"latitude": 1.0, "longitude": 1.0}"#,
            r#"{"latitude": 1.0, "longitude": 1.0, "daily": {"data": []}}"#,
            r#"{"latitude": 1.0, "longitude": 1.0, "daily": {"data": [{"icon": "rain"}]}}"#,
            r#"{"latitude": 1.0, "longitude": 1.0, "daily": {"data": [{"time": "monday"}]}}"#,
        ];

        for json in cases {
            assert!(
                matches!(ForecastPayload::decode(json), Err(CacheError::MalformedPayload(_))),
                "expected malformed for {}", json
            );
        }
    }
}

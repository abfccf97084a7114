use thiserror::Error;
use crate::forecast_key::ForecastKey;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ConfigError::File: {0}")]
    File(#[from] std::io::Error),
    #[error("ConfigError::Document: {0}")]
    Document(#[from] toml::de::Error),
    #[error("ConfigError::Value: {0}")]
    Value(String),
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self {
        ConfigError::Value(e.to_string())
    }
}

#[derive(Error, Debug)]
#[error("error setting up logging: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self {
        LoggingError(e.to_string())
    }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self {
        LoggingError(e.to_string())
    }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self {
        LoggingError(e.to_string())
    }
}

/// Failure reading from or writing to the persistent key/value store
#[derive(Error, Debug)]
#[error("error in persistent storage: {0}")]
pub struct StorageError(pub String);
impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("location index {index} out of range, store holds {size}")]
    Index { index: usize, size: usize },
    #[error("invalid coordinates {latitude},{longitude}")]
    Coordinates { latitude: f64, longitude: f64 },
    #[error("location persistence failed: {0}")]
    Persistence(#[from] StorageError),
    #[error("location document error: {0}")]
    Document(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
#[error("error in communication with forecast provider: {0}")]
pub struct FetchError(pub String);
impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> FetchError {
        FetchError(format!("http request error: {}", e))
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("location index {index} out of range, store holds {size}")]
    Index { index: usize, size: usize },
    #[error("invalid coordinates {latitude},{longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("no stored location at {latitude},{longitude}")]
    UnknownLocation { latitude: f64, longitude: f64 },
    #[error("no pending callback for forecast {0}")]
    NoPendingCallback(ForecastKey),
    #[error("forecast persistence failed: {0}")]
    Persistence(String),
    #[error("malformed forecast payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
impl From<StoreError> for CacheError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Index { index, size } => CacheError::Index { index, size },
            StoreError::Coordinates { latitude, longitude } => CacheError::InvalidCoordinates { latitude, longitude },
            StoreError::Persistence(e) => CacheError::Persistence(e.to_string()),
            StoreError::Document(e) => CacheError::Persistence(e.to_string()),
        }
    }
}

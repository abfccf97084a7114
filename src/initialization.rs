use std::sync::mpsc::Receiver;
use anyhow::{Context, Result};
use log::info;
use crate::config::{load_config, Config};
use crate::forecast_cache::ForecastCache;
use crate::location_store::LocationStore;
use crate::logging::setup_logger;
use crate::manager_forecast_io::{Delivery, ForecastIo};
use crate::storage::FileStorage;

/// Everything needed to serve forecasts for one session
pub struct Mgr {
    pub cache: ForecastCache<FileStorage, ForecastIo>,
    pub deliveries: Receiver<Delivery>,
}

/// Loads configuration, sets up logging and restores the location store saved by the
/// previous session
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn init(config_path: &str) -> Result<(Config, Mgr)> {
    let config = load_config(config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;

    setup_logger(&config.general)?;
    info!("weathercache version: {}", env!("CARGO_PKG_VERSION"));

    let storage = FileStorage::new(&config.storage.dir)
        .with_context(|| format!("failed to open storage in {}", config.storage.dir))?;
    let store = LocationStore::restore(storage, &config.storage.locations_key())
        .context("failed to restore saved locations")?;

    let (forecast_io, deliveries) = ForecastIo::new(&config.forecast_io);
    let cache = ForecastCache::new(store, forecast_io);

    Ok((config, Mgr { cache, deliveries }))
}

use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::{error, warn};
use crate::initialization::{init, Mgr};
use crate::manager_forecast_io::Delivery;
use crate::models::forecast_io::DailyForecast;

mod config;
mod errors;
mod forecast_cache;
mod forecast_key;
mod initialization;
mod location_store;
mod logging;
mod manager_forecast_io;
mod models;
mod storage;

#[derive(Parser)]
#[command(version, about = "Keeps daily weather forecasts for saved locations")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists saved locations
    List,
    /// Saves a location, prints its index
    Add {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        nickname: String,
    },
    /// Removes the location at the given index
    Remove { index: usize },
    /// Removes every saved location
    Clear,
    /// Prints the index of the location with the given nickname
    Find { nickname: String },
    /// Prints the daily forecast for one or all saved locations
    Forecast {
        #[arg(long)]
        index: Option<usize>,
        /// Calendar day, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Fetch even if the forecast is already saved
        #[arg(long)]
        refresh: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, mut mgr) = init(&cli.config)?;

    match cli.command {
        Command::List => {
            for (i, l) in mgr.cache.locations().iter().enumerate() {
                println!("{:>3}: {} ({}, {}), {} forecasts saved", i, l.nickname, l.latitude, l.longitude, l.forecasts.len());
            }
        },
        Command::Add { latitude, longitude, nickname } => {
            let index = mgr.cache.locations_mut().add(latitude, longitude, &nickname)?;
            println!("{}", index);
        },
        Command::Remove { index } => mgr.cache.locations_mut().remove_at(index)?,
        Command::Clear => mgr.cache.locations_mut().remove_all()?,
        Command::Find { nickname } => {
            match mgr.cache.locations().index_for_nickname(&nickname) {
                Some(index) => println!("{}", index),
                None => println!("No location named '{}'", nickname),
            }
        },
        Command::Forecast { index, date, refresh } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let timeout = Duration::from_secs(config.forecast_io.timeout_secs);
            forecast(&mut mgr, index, date, refresh)?;
            wait_for_deliveries(&mut mgr, timeout);
        },
    }

    Ok(())
}

/// Requests forecasts for one or all locations, printing each as it becomes available
///
/// # Arguments
///
/// * 'mgr' - the session's forecast cache and delivery channel
/// * 'index' - location to request for, all locations if None
/// * 'date' - the calendar day
/// * 'refresh' - whether to bypass saved forecasts
fn forecast(mgr: &mut Mgr, index: Option<usize>, date: NaiveDate, refresh: bool) -> Result<()> {
    let indexes: Vec<usize> = match index {
        Some(i) => vec![i],
        None => (0..mgr.cache.locations().len()).collect(),
    };

    for i in indexes {
        let nickname = mgr.cache.locations().at(i)?.nickname.clone();
        let print = move |_: usize, forecast: &DailyForecast| println!("{}", summary(&nickname, forecast));

        if refresh {
            mgr.cache.refresh_forecast(i, date, print)?;
        } else {
            mgr.cache.request_forecast(i, date, print)?;
        }
    }

    Ok(())
}

/// Hands delivered forecasts to the cache until nothing is pending or no delivery arrives
/// within the timeout
///
/// # Arguments
///
/// * 'mgr' - the session's forecast cache and delivery channel
/// * 'timeout' - longest time to wait for the next delivery
fn wait_for_deliveries(mgr: &mut Mgr, timeout: Duration) {
    while mgr.cache.pending_count() > 0 {
        match mgr.deliveries.recv_timeout(timeout) {
            Ok(Delivery { key, outcome: Ok(body) }) => {
                if let Err(e) = mgr.cache.on_response(&body) {
                    error!("forecast {} could not be handled: {}", key, e);
                    println!("Forecast {} could not be handled: {}", key, e);
                    mgr.cache.cancel(&key);
                }
            },
            Ok(Delivery { key, outcome: Err(e) }) => {
                println!("Forecast {} unavailable: {}", key, e);
                mgr.cache.cancel(&key);
            },
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                warn!("gave up waiting for {} forecasts", mgr.cache.pending_count());
                println!("Gave up waiting for {} forecasts", mgr.cache.pending_count());
                break;
            },
        }
    }
}

fn summary(nickname: &str, forecast: &DailyForecast) -> String {
    let temp = |t: Option<f64>| t.map_or("-".to_string(), |t| format!("{:.1}", t));

    format!("{}: Min: {}, Max: {} ({})",
            nickname,
            temp(forecast.min_temperature()),
            temp(forecast.max_temperature()),
            forecast.icon.as_deref().unwrap_or("unknown"))
}

use std::env;
use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;

/// Environment variable overriding the api key given in the config file
pub const API_KEY_VAR: &str = "FORECAST_IO_API_KEY";

#[derive(Deserialize)]
pub struct ForecastIoParameters {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_exclude")]
    pub exclude: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Deserialize)]
pub struct StorageParameters {
    pub dir: String,
    #[serde(default = "default_app_prefix")]
    pub app_prefix: String,
}

impl StorageParameters {
    /// The single key the location store is saved under
    pub fn locations_key(&self) -> String {
        format!("{}-locations", self.app_prefix)
    }
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Config {
    pub forecast_io: ForecastIoParameters,
    pub storage: StorageParameters,
    pub general: General,
}

fn default_base_url() -> String { "https://api.forecast.io".to_string() }
fn default_exclude() -> String { "hourly,minutely,currently".to_string() }
fn default_units() -> String { "ca".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_app_prefix() -> String { "weatherApp".to_string() }

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    let mut config = parse_config(&toml)?;

    if let Ok(api_key) = env::var(API_KEY_VAR) {
        config.forecast_io.api_key = api_key;
    }
    if config.forecast_io.api_key.is_empty() {
        return Err(ConfigError::from("no forecast.io api key in config or environment"));
    }

    Ok(config)
}

/// Parses a configuration document
///
/// # Arguments
///
/// * 'toml' - the configuration as a toml string
fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(toml)?;

    if !config.storage.dir.ends_with('/') {
        config.storage.dir.push('/');
    }
    if !config.general.log_path.ends_with('/') {
        config.general.log_path.push('/');
    }

    Ok(config)
}

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;
use log::{debug, error};
use ureq::Agent;
use crate::config::ForecastIoParameters;
use crate::errors::FetchError;
use crate::forecast_cache::{Fetcher, ForecastRequest};
use crate::forecast_key::ForecastKey;

/// Outcome of one forecast request, tagged with the key it was issued for
pub struct Delivery {
    pub key: ForecastKey,
    pub outcome: Result<String, FetchError>,
}

/// Fetcher for daily forecasts from the forecast.io (Dark Sky style) API.
///
/// Every request runs on its own thread and its outcome is sent back over a channel,
/// whoever drives the forecast cache reads the channel and hands the bodies to the cache.
pub struct ForecastIo {
    agent: Agent,
    base_url: String,
    api_key: String,
    exclude: String,
    units: String,
    sender: Sender<Delivery>,
}

impl ForecastIo {
    /// Returns a new ForecastIo together with the receiving end of its delivery channel
    ///
    /// # Arguments
    ///
    /// * 'config' - forecast provider configuration
    pub fn new(config: &ForecastIoParameters) -> (ForecastIo, Receiver<Delivery>) {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        let agent = agent_config.into();
        let (sender, receiver) = channel();

        let forecast_io = Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.to_string(),
            exclude: config.exclude.to_string(),
            units: config.units.to_string(),
            sender,
        };

        (forecast_io, receiver)
    }

    /// Builds the request url for a forecast, any sub daily granularity is excluded
    ///
    /// # Arguments
    ///
    /// * 'request' - the forecast request
    fn url(&self, request: &ForecastRequest) -> String {
        format!("{}/forecast/{}/{},{},{}?exclude={}&units={}",
                self.base_url, self.api_key,
                request.latitude, request.longitude, request.date_string,
                self.exclude, self.units)
    }
}

impl Fetcher for ForecastIo {
    fn fetch(&mut self, request: ForecastRequest) -> Result<(), FetchError> {
        let url = self.url(&request);
        let agent = self.agent.clone();
        let sender = self.sender.clone();
        let key = request.key;

        thread::Builder::new()
            .name(format!("fetch {}", key))
            .spawn(move || {
                let outcome = get_body(&agent, &url);
                if let Err(e) = &outcome {
                    error!("forecast {} failed: {}", key, e);
                }
                if sender.send(Delivery { key, outcome }).is_err() {
                    debug!("forecast delivered after receiver was dropped");
                }
            })
            .map_err(|e| FetchError(format!("unable to start request thread: {}", e)))?;

        Ok(())
    }
}

fn get_body(agent: &Agent, url: &str) -> Result<String, FetchError> {
    let body = agent
        .get(url)
        .call()?
        .body_mut()
        .read_to_string()?;

    Ok(body)
}

use crate::{
    Config,
    error::WeatherError,
    model::{AirQualityPayload, Coordinates, CurrentPayload, ForecastPayload, GeoMatch, Query},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Where requests go and who supplies the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentMode {
    /// Straight to OpenWeather; the credential is appended client-side.
    Direct,
    /// Through the local proxy, which injects the credential server-side.
    Proxy,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Direct => "direct",
            DeploymentMode::Proxy => "proxy",
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.proxy_url.as_deref().is_some_and(|u| !u.trim().is_empty()) {
            DeploymentMode::Proxy
        } else {
            DeploymentMode::Direct
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The upstream weather service as seen by the controller.
///
/// Payloads are returned as decoded; callers check for absent blocks.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(&self, query: &Query) -> Result<CurrentPayload, WeatherError>;

    async fn forecast(&self, query: &Query) -> Result<ForecastPayload, WeatherError>;

    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityPayload, WeatherError>;

    /// `Ok(None)` when the name matches no place.
    async fn resolve_city(&self, name: &str) -> Result<Option<GeoMatch>, WeatherError>;
}

/// Construct a client for the deployment mode the config describes.
pub fn client_from_config(config: &Config) -> Result<Box<dyn WeatherApi>, WeatherError> {
    let client = match (DeploymentMode::from_config(config), config.proxy_url.as_deref()) {
        (DeploymentMode::Proxy, Some(proxy_url)) => OpenWeatherClient::via_proxy(proxy_url, config)?,
        _ => {
            let api_key = config.api_key().ok_or(WeatherError::MissingApiKey)?;
            OpenWeatherClient::direct(api_key, config)?
        }
    };

    Ok(Box::new(client))
}

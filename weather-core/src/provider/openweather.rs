use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    error::WeatherError,
    model::{AirQualityPayload, Coordinates, CurrentPayload, ForecastPayload, GeoMatch, Query},
};

use super::{DeploymentMode, WeatherApi};

/// The four OpenWeather resources this client knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
    AirQuality,
    Geocode,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
            Endpoint::AirQuality => "air_pollution",
            Endpoint::Geocode => "direct",
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    Direct { base_url: String, geo_base_url: String, api_key: String },
    Proxy { base_url: String },
}

/// Status and body exactly as the service returned them.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    target: Target,
    language: String,
    retry_attempts: u32,
}

impl OpenWeatherClient {
    pub fn direct(api_key: &str, config: &Config) -> Result<Self, WeatherError> {
        Ok(Self {
            http: build_http(config.timeout())?,
            target: Target::Direct {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                geo_base_url: config.geo_base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
            },
            language: config.language.clone(),
            retry_attempts: config.retry_attempts,
        })
    }

    pub fn via_proxy(proxy_url: &str, config: &Config) -> Result<Self, WeatherError> {
        Ok(Self {
            http: build_http(config.timeout())?,
            target: Target::Proxy { base_url: proxy_url.trim().trim_end_matches('/').to_string() },
            language: config.language.clone(),
            retry_attempts: config.retry_attempts,
        })
    }

    pub fn mode(&self) -> DeploymentMode {
        match self.target {
            Target::Direct { .. } => DeploymentMode::Direct,
            Target::Proxy { .. } => DeploymentMode::Proxy,
        }
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        match &self.target {
            Target::Direct { geo_base_url, .. } if endpoint == Endpoint::Geocode => {
                format!("{geo_base_url}/{}", endpoint.as_str())
            }
            Target::Direct { base_url, .. } => format!("{base_url}/{}", endpoint.as_str()),
            Target::Proxy { base_url } => match endpoint {
                Endpoint::Current | Endpoint::Forecast => {
                    format!("{base_url}/api/weather/{}", endpoint.as_str())
                }
                Endpoint::AirQuality => format!("{base_url}/api/air-quality"),
                Endpoint::Geocode => format!("{base_url}/api/geocode"),
            },
        }
    }

    /// Send one GET and hand back status and body untouched. Transport
    /// failures are retried up to `retry_attempts` times; statuses never are.
    #[instrument(skip(self, params), fields(mode = %self.mode()))]
    pub async fn forward(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<RawResponse, WeatherError> {
        let url = self.url_for(endpoint);
        let mut query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        if let Target::Direct { api_key, .. } = &self.target {
            query.push(("appid", api_key.as_str()));
        }

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &query).await {
                Err(WeatherError::Transport(reason)) if attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(attempt, %reason, "transport failure, retrying");
                    tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            // the URL carries the credential
            .map_err(|e| WeatherError::Transport(e.without_url().to_string()))?;

        let status = res.status();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Transport(e.without_url().to_string()))?;

        debug!(%status, bytes = body.len(), "response received");
        Ok(RawResponse { status, content_type, body })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        mut params: Vec<(&str, String)>,
    ) -> Result<T, WeatherError> {
        params.push(("units", "metric".to_string()));
        params.push(("lang", self.language.clone()));

        let raw = self.forward(endpoint, &params).await?;
        if !raw.status.is_success() {
            return Err(WeatherError::upstream(raw.status));
        }

        serde_json::from_str(&raw.body).map_err(|e| {
            WeatherError::Parse(format!("{} response: {e}", endpoint.as_str()))
        })
    }
}

fn build_http(timeout: Duration) -> Result<Client, WeatherError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("weather-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| WeatherError::Transport(format!("failed to build HTTP client: {e}")))
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn current_weather(&self, query: &Query) -> Result<CurrentPayload, WeatherError> {
        self.fetch_json(Endpoint::Current, query.params()).await
    }

    #[instrument(skip(self))]
    async fn forecast(&self, query: &Query) -> Result<ForecastPayload, WeatherError> {
        self.fetch_json(Endpoint::Forecast, query.params()).await
    }

    #[instrument(skip(self))]
    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityPayload, WeatherError> {
        self.fetch_json(Endpoint::AirQuality, Query::Coords(coords).params()).await
    }

    #[instrument(skip(self))]
    async fn resolve_city(&self, name: &str) -> Result<Option<GeoMatch>, WeatherError> {
        let params = vec![("q", name.to_string()), ("limit", "1".to_string())];
        let matches: Vec<GeoMatch> = self.fetch_json(Endpoint::Geocode, params).await?;
        Ok(matches.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            base_url: "https://owm.test/data/2.5/".into(),
            geo_base_url: "https://owm.test/geo/1.0".into(),
            ..Config::default()
        }
    }

    #[test]
    fn direct_urls_use_both_bases() {
        let client = OpenWeatherClient::direct("KEY", &config()).unwrap();
        assert_eq!(client.mode(), DeploymentMode::Direct);
        assert_eq!(client.url_for(Endpoint::Current), "https://owm.test/data/2.5/weather");
        assert_eq!(client.url_for(Endpoint::AirQuality), "https://owm.test/data/2.5/air_pollution");
        assert_eq!(client.url_for(Endpoint::Geocode), "https://owm.test/geo/1.0/direct");
    }

    #[test]
    fn proxy_urls_map_to_proxy_routes() {
        let client = OpenWeatherClient::via_proxy("http://localhost:3000/", &config()).unwrap();
        assert_eq!(client.mode(), DeploymentMode::Proxy);
        assert_eq!(client.url_for(Endpoint::Forecast), "http://localhost:3000/api/weather/forecast");
        assert_eq!(client.url_for(Endpoint::AirQuality), "http://localhost:3000/api/air-quality");
        assert_eq!(client.url_for(Endpoint::Geocode), "http://localhost:3000/api/geocode");
    }
}

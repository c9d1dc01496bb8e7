//! Static file server plus a credential-holding proxy in front of
//! OpenWeather. The browser widget and `proxy_url` clients both talk to it.

use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path as UrlPath, Query as QueryParams, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use weather_core::{
    Config, Theme, WeatherError,
    provider::openweather::{Endpoint, OpenWeatherClient, RawResponse},
};

type Params = HashMap<String, String>;

/// Client settings published at `/api/config`. Never carries the credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClientConfig {
    api_base_url: String,
    app_name: String,
    app_version: String,
    enable_location: bool,
    enable_dark_mode: bool,
    enable_air_quality: bool,
    enable_auto_refresh: bool,
    auto_refresh_interval: u64,
    api_timeout: u64,
    api_retry_attempts: u32,
    location_timeout: u64,
    location_high_accuracy: bool,
    location_max_age: u64,
    default_theme: Theme,
    welcome_screen_enabled: bool,
    toast_duration: u64,
    sanitize_input: bool,
    validate_city_names: bool,
    max_city_name_length: usize,
}

impl From<&Config> for ClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_base_url: "/api/weather".to_string(),
            app_name: config.app_name.clone(),
            app_version: config.app_version.clone(),
            enable_location: config.features.location,
            enable_dark_mode: config.features.dark_mode,
            enable_air_quality: config.features.air_quality,
            enable_auto_refresh: config.features.auto_refresh,
            auto_refresh_interval: config.auto_refresh_minutes,
            api_timeout: config.timeout_ms,
            api_retry_attempts: config.retry_attempts,
            location_timeout: config.location_timeout_ms,
            location_high_accuracy: config.location_high_accuracy,
            location_max_age: config.location_max_age_ms,
            default_theme: config.default_theme,
            welcome_screen_enabled: config.welcome_screen,
            toast_duration: config.toast_duration_ms,
            sanitize_input: config.input.sanitize,
            validate_city_names: config.input.validate_city_names,
            max_city_name_length: config.input.max_city_name_length,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyState {
    /// Absent when no credential is configured; every proxied call then fails.
    upstream: Option<Arc<OpenWeatherClient>>,
    client_config: Arc<ClientConfig>,
    language: String,
}

impl ProxyState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let upstream = match config.api_key() {
            Some(key) => Some(Arc::new(OpenWeatherClient::direct(key, config)?)),
            None => {
                warn!("no OpenWeather API key configured; proxied requests will fail");
                None
            }
        };

        Ok(Self {
            upstream,
            client_config: Arc::new(ClientConfig::from(config)),
            language: config.language.clone(),
        })
    }

    fn upstream(&self) -> Result<&OpenWeatherClient, ProxyError> {
        self.upstream
            .as_deref()
            .ok_or(ProxyError::Internal("API key is not configured on the server"))
    }
}

#[derive(Debug)]
enum ProxyError {
    NotFound(String),
    BadRequest(&'static str),
    Internal(&'static str),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProxyError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ProxyError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.to_string()),
            ProxyError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Upstream status, content type and body, unchanged. OpenWeather is a
/// JSON API, so a missing content type is reported as JSON.
fn relay(raw: RawResponse) -> Response {
    let content_type = raw.content_type.unwrap_or_else(|| "application/json".to_string());
    (raw.status, [(header::CONTENT_TYPE, content_type)], raw.body).into_response()
}

async fn forward(
    client: &OpenWeatherClient,
    endpoint: Endpoint,
    params: &[(&str, String)],
    failure: &'static str,
) -> Result<Response, ProxyError> {
    client.forward(endpoint, params).await.map(relay).map_err(|err: WeatherError| {
        error!(error = %err, endpoint = endpoint.as_str(), "upstream request failed");
        ProxyError::Internal(failure)
    })
}

fn take(params: &Params, key: &str) -> Option<String> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

async fn client_config(State(state): State<ProxyState>) -> Json<ClientConfig> {
    Json(state.client_config.as_ref().clone())
}

async fn weather(
    State(state): State<ProxyState>,
    UrlPath(endpoint): UrlPath<String>,
    QueryParams(params): QueryParams<Params>,
) -> Result<Response, ProxyError> {
    let endpoint = match endpoint.as_str() {
        "weather" => Endpoint::Current,
        "forecast" => Endpoint::Forecast,
        other => return Err(ProxyError::NotFound(format!("Unknown weather endpoint '{other}'"))),
    };
    let client = state.upstream()?;

    let mut query = Vec::new();
    match (take(&params, "q"), take(&params, "lat"), take(&params, "lon")) {
        (Some(q), _, _) => query.push(("q", q)),
        (None, Some(lat), Some(lon)) => query.extend([("lat", lat), ("lon", lon)]),
        _ => return Err(ProxyError::BadRequest("Either q or lat and lon is required")),
    }
    query.push(("units", take(&params, "units").unwrap_or_else(|| "metric".to_string())));
    query.push(("lang", take(&params, "lang").unwrap_or_else(|| state.language.clone())));

    forward(client, endpoint, &query, "Weather data could not be retrieved").await
}

async fn air_quality(
    State(state): State<ProxyState>,
    QueryParams(params): QueryParams<Params>,
) -> Result<Response, ProxyError> {
    let (Some(lat), Some(lon)) = (take(&params, "lat"), take(&params, "lon")) else {
        return Err(ProxyError::BadRequest("Coordinates are required"));
    };
    let client = state.upstream()?;

    forward(
        client,
        Endpoint::AirQuality,
        &[("lat", lat), ("lon", lon)],
        "Air quality data could not be retrieved",
    )
    .await
}

async fn geocode(
    State(state): State<ProxyState>,
    QueryParams(params): QueryParams<Params>,
) -> Result<Response, ProxyError> {
    let Some(q) = take(&params, "q") else {
        return Err(ProxyError::BadRequest("A city name is required"));
    };
    let client = state.upstream()?;
    let limit = take(&params, "limit").unwrap_or_else(|| "1".to_string());

    forward(client, Endpoint::Geocode, &[("q", q), ("limit", limit)], "Location lookup failed").await
}

fn api_router() -> Router<ProxyState> {
    Router::new()
        .route("/config", get(client_config))
        .route("/weather/{endpoint}", get(weather))
        .route("/air-quality", get(air_quality))
        .route("/geocode", get(geocode))
}

pub fn router(state: ProxyState, static_dir: &Path) -> Router {
    Router::new()
        .nest("/api", api_router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let state = ProxyState::from_config(config)?;
    let app = router(state, &config.server.static_dir);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        "{} server running at http://localhost:{} (static files from {})",
        config.app_name,
        config.server.port,
        config.server.static_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")
}

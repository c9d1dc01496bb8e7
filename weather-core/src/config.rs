use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";

/// Colour scheme the user starts with before toggling anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the platform's ambient preference.
    System,
}

/// Feature switches exposed to the client through `/api/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub location: bool,
    pub dark_mode: bool,
    pub air_quality: bool,
    pub auto_refresh: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self { location: true, dark_mode: true, air_quality: true, auto_refresh: true }
    }
}

/// Rules applied to a city name before any request is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputRules {
    pub sanitize: bool,
    pub validate_city_names: bool,
    pub max_city_name_length: usize,
}

impl Default for InputRules {
    fn default() -> Self {
        Self { sanitize: true, validate_city_names: true, max_city_name_length: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000, static_dir: PathBuf::from(".") }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// language = "en"
///
/// [features]
/// air_quality = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather credential. Only the proxy or a direct-mode client needs it.
    pub api_key: Option<String>,
    pub base_url: String,
    pub geo_base_url: String,
    /// When set, the client talks to a local proxy instead of OpenWeather.
    pub proxy_url: Option<String>,
    /// Response language flag sent with every request.
    pub language: String,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    pub auto_refresh_minutes: u64,
    pub toast_duration_ms: u64,
    /// Geolocation settings handed to browser clients through `/api/config`.
    pub location_timeout_ms: u64,
    pub location_high_accuracy: bool,
    pub location_max_age_ms: u64,
    pub welcome_screen: bool,
    pub default_theme: Theme,
    pub app_name: String,
    pub app_version: String,
    pub features: Features,
    pub input: InputRules,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            proxy_url: None,
            language: "en".to_string(),
            timeout_ms: 10_000,
            retry_attempts: 0,
            auto_refresh_minutes: 5,
            toast_duration_ms: 5_000,
            location_timeout_ms: 10_000,
            location_high_accuracy: true,
            location_max_age_ms: 300_000,
            welcome_screen: true,
            default_theme: Theme::default(),
            app_name: "WeatherApp".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            features: Features::default(),
            input: InputRules::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };

        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-widget", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted client state (recent searches, theme).
    pub fn state_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("state.json"))
    }

    /// `OPENWEATHER_API_KEY` and `PORT` take precedence over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("OPENWEATHER_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }

        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{port}'"))?;
        }

        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_minutes.max(1) * 60)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

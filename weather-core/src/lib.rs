//! Core library for the weather widget.
//!
//! This crate defines:
//! - Configuration handling
//! - The OpenWeather client, in direct or proxy mode
//! - View models, formatting and the display-port renderer
//! - Notifications, persisted client state and the search controller
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod controller;
pub mod error;
pub mod forecast;
pub mod format;
pub mod icon;
pub mod input;
pub mod model;
pub mod notify;
pub mod provider;
pub mod render;
pub mod storage;

pub use config::{Config, Features, InputRules, ServerConfig, Theme};
pub use controller::{AppSettings, AppStatus, SearchOutcome, WeatherApp, run_auto_refresh};
pub use error::WeatherError;
pub use model::{
    AirQualitySample, Coordinates, CurrentConditions, DailySummary, ForecastEntry, GeoMatch, Query,
};
pub use notify::{Notifier, ToastLevel, ToastQueue};
pub use provider::{DeploymentMode, WeatherApi, client_from_config};
pub use render::{DisplayPort, Region, Surface, ViewRenderer};

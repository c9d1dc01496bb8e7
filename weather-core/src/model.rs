use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// What a weather lookup is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    City(String),
    Coords(Coordinates),
}

impl Query {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Query::City(name) => vec![("q", name.clone())],
            Query::Coords(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        }
    }
}

/// A single geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMatch {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
}

impl GeoMatch {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.lon }
    }
}

// Upstream payloads. Every block is optional: the provider's schema is
// not validated, conversions below decide what is mandatory.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwCondition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwMain {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwWind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwSys {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CurrentPayload {
    #[serde(default)]
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub weather: Vec<OwCondition>,
    #[serde(default)]
    pub main: Option<OwMain>,
    #[serde(default)]
    pub wind: Option<OwWind>,
    #[serde(default)]
    pub sys: Option<OwSys>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwForecastItem {
    pub dt: i64,
    #[serde(default)]
    pub main: Option<OwMain>,
    #[serde(default)]
    pub weather: Vec<OwCondition>,
    /// Probability of precipitation, 0..=1.
    #[serde(default)]
    pub pop: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub coord: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub list: Vec<OwForecastItem>,
    #[serde(default)]
    pub city: Option<OwCity>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwAqiMain {
    pub aqi: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pollutants {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwAirItem {
    pub main: OwAqiMain,
    #[serde(default)]
    pub components: Pollutants,
    #[serde(default)]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AirQualityPayload {
    #[serde(default)]
    pub list: Vec<OwAirItem>,
}

// View models.

/// Current conditions, temperatures in degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub country: String,
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub condition: String,
    pub description: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub condition: String,
    pub description: String,
    /// 0..=1
    pub precipitation_probability: f64,
}

/// One representative forecast entry per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub entry: ForecastEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualitySample {
    pub aqi: u32,
    pub pollutants: Pollutants,
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

/// An empty keyword when upstream sent no condition, so the icon
/// resolver falls back to its default glyph.
fn first_condition(conditions: &[OwCondition]) -> (String, String) {
    conditions
        .first()
        .map(|w| (w.main.clone(), w.description.clone()))
        .unwrap_or_else(|| (String::new(), "Unknown".to_string()))
}

impl TryFrom<&CurrentPayload> for CurrentConditions {
    type Error = WeatherError;

    fn try_from(payload: &CurrentPayload) -> Result<Self, Self::Error> {
        let main = payload
            .main
            .as_ref()
            .ok_or_else(|| WeatherError::Parse("current weather has no `main` block".into()))?;

        let (condition, description) = first_condition(&payload.weather);
        let sys = payload.sys.clone().unwrap_or_default();

        Ok(Self {
            location_name: payload.name.clone().unwrap_or_default(),
            country: sys.country.unwrap_or_default(),
            observed_at: payload.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now),
            temperature_c: main.temp,
            feels_like_c: main.feels_like.unwrap_or(main.temp),
            humidity_pct: main.humidity.unwrap_or_default(),
            pressure_hpa: main.pressure.unwrap_or_default(),
            wind_speed_mps: payload.wind.as_ref().map(|w| w.speed).unwrap_or_default(),
            condition,
            description,
            sunrise: sys.sunrise.and_then(unix_to_utc),
            sunset: sys.sunset.and_then(unix_to_utc),
            coordinates: payload.coord,
        })
    }
}

impl ForecastPayload {
    /// Entries with a `main` block, ascending by timestamp.
    pub fn entries(&self) -> Vec<ForecastEntry> {
        let mut entries: Vec<ForecastEntry> = self
            .list
            .iter()
            .filter_map(|item| {
                let main = item.main.as_ref()?;
                let time = unix_to_utc(item.dt)?;
                let (condition, description) = first_condition(&item.weather);
                Some(ForecastEntry {
                    time,
                    temperature_c: main.temp,
                    temp_min_c: main.temp_min.unwrap_or(main.temp),
                    temp_max_c: main.temp_max.unwrap_or(main.temp),
                    condition,
                    description,
                    precipitation_probability: item.pop.unwrap_or_default().clamp(0.0, 1.0),
                })
            })
            .collect();

        entries.sort_by_key(|e| e.time);
        entries
    }
}

impl TryFrom<&AirQualityPayload> for AirQualitySample {
    type Error = WeatherError;

    fn try_from(payload: &AirQualityPayload) -> Result<Self, Self::Error> {
        let item = payload
            .list
            .first()
            .ok_or_else(|| WeatherError::Parse("air quality response contained no data".into()))?;

        Ok(Self { aqi: item.main.aqi, pollutants: item.components.clone() })
    }
}

//! Pure display formatting for temperatures, times and air quality.

use chrono::{DateTime, Days, TimeZone};
use serde::{Deserialize, Serialize};

/// Clock style for hour:minute labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockFormat {
    #[default]
    H24,
    H12,
}

/// Rounds to the nearest integer and appends the degree sign.
pub fn format_temperature(celsius: f64) -> String {
    let rounded = celsius.round();
    // -0.4 rounds to -0; show it as 0
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.0}°")
}

pub fn format_clock_time<Tz: TimeZone>(time: &DateTime<Tz>, clock: ClockFormat) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match clock {
        ClockFormat::H24 => time.format("%H:%M").to_string(),
        ClockFormat::H12 => time.format("%-I:%M %p").to_string(),
    }
}

/// "Today", "Tomorrow" or the short weekday name, compared on calendar
/// dates in the time zone `time` and `now` are expressed in.
pub fn format_relative_day<Tz: TimeZone>(time: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = time.date_naive();
    let today = now.date_naive();

    if day == today {
        "Today".to_string()
    } else if today.checked_add_days(Days::new(1)) == Some(day) {
        "Tomorrow".to_string()
    } else {
        time.format("%a").to_string()
    }
}

/// Long date line such as "Tuesday, 14 October 2026".
pub fn format_long_date<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%A, %-d %B %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
    Hazardous,
}

impl Severity {
    pub fn class(&self) -> &'static str {
        match self {
            Severity::Excellent => "air-excellent",
            Severity::Good => "air-good",
            Severity::Moderate => "air-moderate",
            Severity::Poor => "air-poor",
            Severity::VeryPoor => "air-very-poor",
            Severity::Hazardous => "air-hazardous",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQualityBand {
    pub label: &'static str,
    pub severity: Severity,
    pub description: &'static str,
}

const BANDS: [(u32, AirQualityBand); 5] = [
    (
        50,
        AirQualityBand {
            label: "Excellent",
            severity: Severity::Excellent,
            description: "Air quality is very good, enjoy outdoor activities",
        },
    ),
    (
        100,
        AirQualityBand {
            label: "Good",
            severity: Severity::Good,
            description: "Air quality is acceptable",
        },
    ),
    (
        150,
        AirQualityBand {
            label: "Moderate",
            severity: Severity::Moderate,
            description: "Sensitive groups should take care",
        },
    ),
    (
        200,
        AirQualityBand {
            label: "Poor",
            severity: Severity::Poor,
            description: "Health effects possible, limit time outdoors",
        },
    ),
    (
        300,
        AirQualityBand {
            label: "Very Poor",
            severity: Severity::VeryPoor,
            description: "Health warning, avoid outdoor activity",
        },
    ),
];

const HAZARDOUS: AirQualityBand = AirQualityBand {
    label: "Hazardous",
    severity: Severity::Hazardous,
    description: "Emergency conditions, stay indoors if possible",
};

/// Band for an AQI value: upper bounds 50, 100, 150, 200, 300 are inclusive.
pub fn air_quality_band(aqi: u32) -> AirQualityBand {
    BANDS
        .iter()
        .find(|(upper, _)| aqi <= *upper)
        .map_or(HAZARDOUS, |(_, band)| *band)
}

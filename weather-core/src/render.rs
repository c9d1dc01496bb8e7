//! Projection of view models onto named display regions.
//!
//! [`DisplayPort`] is what the controller talks to. [`ViewRenderer`] is the
//! stock implementation: it turns each model into fixed-shape text and
//! writes it to a host [`Surface`], skipping regions the host lacks.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::{collections::HashSet, fmt::Display};
use tracing::debug;

use crate::{
    format::{
        ClockFormat, air_quality_band, format_clock_time, format_long_date, format_relative_day,
        format_temperature,
    },
    forecast::{DAILY_LIMIT, HOURLY_LIMIT, group_daily},
    icon::icon_for,
    model::{AirQualitySample, CurrentConditions, DailySummary, ForecastEntry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Current,
    Hourly,
    Daily,
    AirQuality,
}

impl Region {
    pub const fn all() -> &'static [Region] {
        &[Region::Current, Region::Hourly, Region::Daily, Region::AirQuality]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Current => "current",
            Region::Hourly => "hourly",
            Region::Daily => "daily",
            Region::AirQuality => "air",
        }
    }
}

impl TryFrom<&str> for Region {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Region::all()
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown section '{value}'. Supported: current, hourly, daily, air.")
            })
    }
}

/// The host page or screen the renderer draws into.
pub trait Surface {
    /// Regions the host actually provides.
    fn regions(&self) -> Vec<Region>;

    /// Replace the whole content of `region`.
    fn write(&mut self, region: Region, content: &str);
}

/// Narrow rendering capability the controller depends on.
pub trait DisplayPort: Send {
    fn render_current(&mut self, conditions: &CurrentConditions);

    fn render_hourly(&mut self, entries: &[ForecastEntry]);

    /// Group forecast entries into days in the zone the daily view is labelled in.
    fn daily_summaries(&self, entries: &[ForecastEntry]) -> Vec<DailySummary>;

    fn render_daily(&mut self, days: &[DailySummary]);

    fn render_air_quality(&mut self, sample: &AirQualitySample);
}

pub fn current_view<Tz: TimeZone>(c: &CurrentConditions, tz: &Tz, clock: ClockFormat) -> String
where
    Tz::Offset: Display,
{
    let clock_at = |t: DateTime<Utc>| format_clock_time(&t.with_timezone(tz), clock);
    let sun = |t: Option<DateTime<Utc>>| t.map_or_else(|| "--:--".to_string(), clock_at);

    let place = if c.country.is_empty() {
        c.location_name.clone()
    } else {
        format!("{}, {}", c.location_name, c.country)
    };

    [
        format!("{} {place}", icon_for(&c.condition)),
        format_long_date(&c.observed_at.with_timezone(tz)),
        format!("{}  {}", format_temperature(c.temperature_c), c.description),
        format!(
            "Feels like {}   Humidity {}%",
            format_temperature(c.feels_like_c),
            c.humidity_pct
        ),
        format!("Wind {:.1} m/s   Pressure {:.0} hPa", c.wind_speed_mps, c.pressure_hpa),
        format!("Sunrise 🌅 {}   Sunset 🌇 {}", sun(c.sunrise), sun(c.sunset)),
        format!("Last update: {}", clock_at(c.observed_at)),
    ]
    .join("\n")
}

/// The first row is always labelled "Now".
pub fn hourly_view<Tz: TimeZone>(
    entries: &[ForecastEntry],
    limit: usize,
    tz: &Tz,
    clock: ClockFormat,
) -> String
where
    Tz::Offset: Display,
{
    entries
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, e)| {
            let label = if i == 0 {
                "Now".to_string()
            } else {
                format_clock_time(&e.time.with_timezone(tz), clock)
            };
            format!(
                "{label:<8} {} {:>3}% {:>5}",
                icon_for(&e.condition),
                percent(e.precipitation_probability),
                format_temperature(e.temperature_c)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const RANGE_BAR_CELLS: usize = 10;

pub fn daily_view<Tz: TimeZone>(days: &[DailySummary], limit: usize, tz: &Tz, now: DateTime<Utc>) -> String
where
    Tz::Offset: Display,
{
    let now = now.with_timezone(tz);
    days.iter()
        .take(limit)
        .map(|d| {
            let e = &d.entry;
            // 4% of the bar per degree of spread, full at 25°
            let fill = ((e.temp_max_c - e.temp_min_c) * 4.0).clamp(0.0, 100.0);
            let cells = ((fill / 100.0) * RANGE_BAR_CELLS as f64).round() as usize;
            let bar = format!("{}{}", "█".repeat(cells), "░".repeat(RANGE_BAR_CELLS - cells));

            format!(
                "{:<9} {} {:<22} 💧{:>3}% {:>5} {bar} {:>5}",
                format_relative_day(&e.time.with_timezone(tz), &now),
                icon_for(&e.condition),
                e.description,
                percent(e.precipitation_probability),
                format_temperature(e.temp_min_c),
                format_temperature(e.temp_max_c),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn air_quality_view(sample: &AirQualitySample) -> String {
    let band = air_quality_band(sample.aqi);
    let p = &sample.pollutants;
    let ug = |v: f64| format!("{:.0} μg/m³", v.round());

    [
        format!("AQI {} · {} [{}]", sample.aqi, band.label, band.severity.class()),
        band.description.to_string(),
        format!("PM2.5 {}   PM10 {}", ug(p.pm2_5), ug(p.pm10)),
        format!("O₃ {}   NO₂ {}", ug(p.o3), ug(p.no2)),
    ]
    .join("\n")
}

fn percent(probability: f64) -> u32 {
    (probability.clamp(0.0, 1.0) * 100.0).round() as u32
}

pub struct ViewRenderer<S, Tz: TimeZone = Local> {
    surface: S,
    regions: HashSet<Region>,
    tz: Tz,
    clock: ClockFormat,
    now: fn() -> DateTime<Utc>,
}

impl<S: Surface> ViewRenderer<S, Local> {
    pub fn new(surface: S, clock: ClockFormat) -> Self {
        Self::with_timezone(surface, Local, clock)
    }
}

impl<S: Surface, Tz: TimeZone> ViewRenderer<S, Tz>
where
    Tz::Offset: Display,
{
    /// Looks up the surface's regions once; later renders never re-query.
    pub fn with_timezone(surface: S, tz: Tz, clock: ClockFormat) -> Self {
        let regions: HashSet<Region> = surface.regions().into_iter().collect();
        debug!(?regions, "display regions cached");
        Self { surface, regions, tz, clock, now: Utc::now }
    }

    pub fn with_now(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn has_region(&self, region: Region) -> bool {
        self.regions.contains(&region)
    }

    fn write(&mut self, region: Region, render: impl FnOnce(&Self) -> String) {
        if !self.has_region(region) {
            debug!(region = region.as_str(), "region absent, skipping update");
            return;
        }
        let content = render(self);
        self.surface.write(region, &content);
    }
}

impl<S, Tz> DisplayPort for ViewRenderer<S, Tz>
where
    S: Surface + Send,
    Tz: TimeZone + Send,
    Tz::Offset: Display + Send,
{
    fn render_current(&mut self, conditions: &CurrentConditions) {
        self.write(Region::Current, |r| current_view(conditions, &r.tz, r.clock));
    }

    fn render_hourly(&mut self, entries: &[ForecastEntry]) {
        self.write(Region::Hourly, |r| hourly_view(entries, HOURLY_LIMIT, &r.tz, r.clock));
    }

    fn daily_summaries(&self, entries: &[ForecastEntry]) -> Vec<DailySummary> {
        group_daily(entries, &self.tz, DAILY_LIMIT)
    }

    fn render_daily(&mut self, days: &[DailySummary]) {
        self.write(Region::Daily, |r| daily_view(days, DAILY_LIMIT, &r.tz, (r.now)()));
    }

    fn render_air_quality(&mut self, sample: &AirQualitySample) {
        self.write(Region::AirQuality, |_| air_quality_view(sample));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pollutants;
    use chrono::{Duration, FixedOffset, NaiveDate};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemorySurface {
        available: Vec<Region>,
        content: BTreeMap<Region, String>,
        writes: usize,
    }

    impl Surface for MemorySurface {
        fn regions(&self) -> Vec<Region> {
            self.available.clone()
        }

        fn write(&mut self, region: Region, content: &str) {
            self.writes += 1;
            self.content.insert(region, content.to_string());
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()
    }

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            location_name: "Istanbul".into(),
            country: "TR".into(),
            observed_at: fixed_now(),
            temperature_c: 22.5,
            feels_like_c: 21.6,
            humidity_pct: 40,
            pressure_hpa: 1015.0,
            wind_speed_mps: 3.14,
            condition: "Clear".into(),
            description: "clear sky".into(),
            sunrise: Some(Utc.with_ymd_and_hms(2026, 10, 14, 4, 12, 0).unwrap()),
            sunset: None,
            coordinates: None,
        }
    }

    fn entry(hours: i64, temp: f64, condition: &str) -> ForecastEntry {
        ForecastEntry {
            time: fixed_now() + Duration::hours(hours),
            temperature_c: temp,
            temp_min_c: temp - 2.0,
            temp_max_c: temp + 3.0,
            condition: condition.into(),
            description: "few clouds".into(),
            precipitation_probability: 0.35,
        }
    }

    fn renderer(available: Vec<Region>) -> ViewRenderer<MemorySurface, Utc> {
        let surface = MemorySurface { available, ..Default::default() };
        ViewRenderer::with_timezone(surface, Utc, ClockFormat::H24).with_now(fixed_now)
    }

    #[test]
    fn current_view_shows_rounded_temperature_and_icon() {
        let text = current_view(&conditions(), &Utc, ClockFormat::H24);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "☀️ Istanbul, TR");
        assert_eq!(lines[1], "Wednesday, 14 October 2026");
        assert!(lines[2].starts_with("23°  clear sky"));
        assert!(lines[3].contains("Feels like 22°"));
        assert!(lines[4].contains("Wind 3.1 m/s"));
        assert!(lines[5].contains("04:12") && lines[5].contains("--:--"));
        assert_eq!(lines[6], "Last update: 09:00");
    }

    #[test]
    fn hourly_first_row_is_now_and_limit_applies() {
        let entries: Vec<_> = (0..10).map(|i| entry(i * 3, 10.0, "Rain")).collect();
        let text = hourly_view(&entries, 8, &Utc, ClockFormat::H24);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("Now"));
        assert!(lines[1].starts_with("12:00"));
        assert!(lines[0].contains("🌧️") && lines[0].contains(" 35%") && lines[0].ends_with("10°"));
    }

    #[test]
    fn daily_view_labels_days_relative_to_now() {
        let days = vec![
            DailySummary { date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(), entry: entry(3, 18.0, "Clear") },
            DailySummary { date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(), entry: entry(27, 15.0, "Snow") },
            DailySummary { date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), entry: entry(51, 12.0, "Volcano") },
        ];
        let text = daily_view(&days, 5, &Utc, fixed_now());
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("Today"));
        assert!(lines[1].starts_with("Tomorrow") && lines[1].contains("❄️"));
        assert!(lines[2].starts_with("Fri") && lines[2].contains("⛅"));
        // spread of 5° fills 20% of the bar
        assert!(lines[0].contains("██░░░░░░░░"));
        assert!(lines[0].contains("16°") && lines[0].contains("21°"));
    }

    #[test]
    fn air_quality_view_uses_band() {
        let sample = AirQualitySample {
            aqi: 51,
            pollutants: Pollutants { pm2_5: 12.4, pm10: 20.6, o3: 60.0, no2: 9.5, ..Default::default() },
        };
        let text = air_quality_view(&sample);
        assert!(text.starts_with("AQI 51 · Good [air-good]"));
        assert!(text.contains("PM2.5 12 μg/m³"));
        assert!(text.contains("PM10 21 μg/m³"));
        assert!(text.contains("NO₂ 10 μg/m³"));
    }

    #[test]
    fn renderer_skips_absent_regions() {
        let mut r = renderer(vec![Region::Current, Region::Daily]);
        r.render_current(&conditions());
        r.render_hourly(&[entry(0, 1.0, "Clear")]);
        r.render_air_quality(&AirQualitySample { aqi: 10, pollutants: Pollutants::default() });

        assert!(r.has_region(Region::Current));
        assert!(!r.has_region(Region::Hourly));
        assert_eq!(r.surface().writes, 1);
        assert!(r.surface().content.contains_key(&Region::Current));
        assert!(!r.surface().content.contains_key(&Region::Hourly));
    }

    #[test]
    fn rerender_replaces_previous_content() {
        let mut r = renderer(Region::all().to_vec());
        r.render_hourly(&[entry(0, 1.0, "Clear"), entry(3, 2.0, "Clear")]);
        r.render_hourly(&[entry(0, 30.0, "Rain")]);

        let hourly = &r.surface().content[&Region::Hourly];
        assert_eq!(hourly.lines().count(), 1);
        assert!(hourly.contains("30°"));
    }

    #[test]
    fn days_are_grouped_in_the_renderer_zone() {
        // 09:00 and 21:00 UTC fall on two different dates at UTC+3
        let entries = [entry(0, 14.0, "Clouds"), entry(12, 9.0, "Rain")];

        let utc = renderer(vec![Region::Daily]);
        assert_eq!(utc.daily_summaries(&entries).len(), 1);

        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let shifted = ViewRenderer::with_timezone(MemorySurface::default(), plus_three, ClockFormat::H24);
        let days = shifted.daily_summaries(&entries);
        assert_eq!(
            days.iter().map(|d| d.date).collect::<Vec<_>>(),
            [NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(), NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()]
        );
        assert_eq!(days[1].entry.condition, "Rain");
    }

    #[test]
    fn region_names_parse() {
        assert_eq!(Region::try_from("Air").unwrap(), Region::AirQuality);
        assert!(Region::try_from("radar").is_err());
    }
}

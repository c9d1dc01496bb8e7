//! Search orchestration and the top-level mutable state.
//!
//! One [`WeatherApp`] is built at startup and handed by reference to
//! whatever owns the event bindings. All ports are injected.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::{
    Config,
    config::InputRules,
    error::WeatherError,
    input::validate_city,
    model::{AirQualitySample, Coordinates, CurrentConditions, ForecastEntry, Query},
    notify::{Notifier, ToastLevel},
    provider::WeatherApi,
    render::DisplayPort,
    storage::{KeyValueStore, RecentSearches, load_dark_mode, save_dark_mode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Loading,
    Error,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Data was fetched and rendered.
    Ready,
    /// Another search is in flight; nothing was requested.
    Busy,
    /// The search failed and one error notification was shown.
    Failed(WeatherError),
}

/// The slice of [`Config`] the controller acts on.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub input: InputRules,
    pub air_quality: bool,
    pub location: bool,
    pub dark_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            input: config.input.clone(),
            air_quality: config.features.air_quality,
            location: config.features.location,
            dark_mode: config.features.dark_mode,
        }
    }
}

#[derive(Debug)]
struct AppState {
    status: AppStatus,
    recent: RecentSearches,
    dark_mode: bool,
}

struct Fetched {
    current: CurrentConditions,
    entries: Vec<ForecastEntry>,
    air: Option<AirQualitySample>,
}

pub struct WeatherApp {
    api: Box<dyn WeatherApi>,
    display: Mutex<Box<dyn DisplayPort>>,
    notifier: Arc<dyn Notifier>,
    store: Mutex<Box<dyn KeyValueStore>>,
    settings: AppSettings,
    state: Mutex<AppState>,
}

impl std::fmt::Debug for WeatherApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApp")
            .field("api", &self.api)
            .field("settings", &self.settings)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

/// Resets the busy indicator and leaves `Loading` even if the search
/// future is dropped halfway.
struct LoadingGuard<'a> {
    app: &'a WeatherApp,
    previous: AppStatus,
    finished: Option<AppStatus>,
}

impl LoadingGuard<'_> {
    fn finish(mut self, status: AppStatus) {
        self.finished = Some(status);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.app.state.lock().status = self.finished.unwrap_or(self.previous);
        self.app.notifier.set_busy(false);
    }
}

impl WeatherApp {
    /// Loads recent searches and the theme flag from `store`.
    pub fn new(
        api: Box<dyn WeatherApi>,
        display: Box<dyn DisplayPort>,
        notifier: Arc<dyn Notifier>,
        store: Box<dyn KeyValueStore>,
        settings: AppSettings,
        ambient_dark: bool,
    ) -> Self {
        let recent = RecentSearches::load(store.as_ref());
        let dark_mode = load_dark_mode(store.as_ref(), ambient_dark);
        debug!(recent = recent.as_slice().len(), dark_mode, "state restored");

        Self {
            api,
            display: Mutex::new(display),
            notifier,
            store: Mutex::new(store),
            settings,
            state: Mutex::new(AppState { status: AppStatus::Idle, recent, dark_mode }),
        }
    }

    pub fn status(&self) -> AppStatus {
        self.state.lock().status
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.state.lock().recent.as_slice().to_vec()
    }

    pub fn dark_mode(&self) -> bool {
        self.state.lock().dark_mode
    }

    fn is_loading(&self) -> bool {
        self.status() == AppStatus::Loading
    }

    fn try_begin(&self) -> Option<LoadingGuard<'_>> {
        let previous = {
            let mut state = self.state.lock();
            if state.status == AppStatus::Loading {
                return None;
            }
            std::mem::replace(&mut state.status, AppStatus::Loading)
        };
        self.notifier.set_busy(true);
        Some(LoadingGuard { app: self, previous, finished: None })
    }

    /// Look up a city by name, render it and remember it.
    #[instrument(skip(self))]
    pub async fn search(&self, input: &str) -> SearchOutcome {
        if self.is_loading() {
            debug!("search already in flight, ignoring");
            return SearchOutcome::Busy;
        }

        let city = match validate_city(input, &self.settings.input) {
            Ok(city) => city,
            Err(err) => {
                self.notifier.show(&err.user_message(), ToastLevel::Error);
                return SearchOutcome::Failed(err);
            }
        };

        let Some(guard) = self.try_begin() else {
            return SearchOutcome::Busy;
        };

        let result = self.fetch_city(&city).await;
        let outcome = self.complete(result, guard);

        if outcome == SearchOutcome::Ready {
            self.remember(&city);
            self.notifier.show(&format!("{city} weather updated"), ToastLevel::Success);
        }
        outcome
    }

    /// Look up a coordinate pair, e.g. a shared device location.
    #[instrument(skip(self))]
    pub async fn search_by_coords(&self, coords: Coordinates) -> SearchOutcome {
        if !self.settings.location {
            let err = WeatherError::Unavailable("Location search");
            self.notifier.show(&err.user_message(), ToastLevel::Error);
            return SearchOutcome::Failed(err);
        }

        let Some(guard) = self.try_begin() else {
            debug!("search already in flight, ignoring");
            return SearchOutcome::Busy;
        };

        let result = self.fetch(Query::Coords(coords), Some(coords)).await;
        self.complete(result, guard)
    }

    /// Re-run the most recent search, if there is one.
    pub async fn refresh(&self) -> Option<SearchOutcome> {
        let last = self.state.lock().recent.most_recent().map(str::to_string)?;
        info!(city = %last, "refreshing");
        Some(self.search(&last).await)
    }

    pub fn toggle_theme(&self) -> Result<bool, WeatherError> {
        if !self.settings.dark_mode {
            return Err(WeatherError::Unavailable("Dark mode"));
        }

        let dark = {
            let mut state = self.state.lock();
            state.dark_mode = !state.dark_mode;
            state.dark_mode
        };
        if let Err(err) = save_dark_mode(self.store.lock().as_mut(), dark) {
            warn!(error = %err, "theme preference not saved");
        }
        Ok(dark)
    }

    async fn fetch_city(&self, city: &str) -> Result<Fetched, WeatherError> {
        let place = self
            .api
            .resolve_city(city)
            .await?
            .ok_or_else(|| WeatherError::GeocodeNotFound(city.to_string()))?;
        debug!(name = %place.name, country = %place.country, "city resolved");

        self.fetch(Query::Coords(place.coordinates()), None).await
    }

    /// Current and forecast are requested together; either failing fails
    /// the search. Air quality follows and may fail silently.
    async fn fetch(&self, query: Query, air_at: Option<Coordinates>) -> Result<Fetched, WeatherError> {
        let (current, forecast) =
            tokio::try_join!(self.api.current_weather(&query), self.api.forecast(&query))?;

        let current = CurrentConditions::try_from(&current)?;
        let entries = forecast.entries();

        let air = match air_at.or(current.coordinates) {
            Some(coords) if self.settings.air_quality => self.fetch_air_quality(coords).await,
            Some(_) => None,
            None => {
                debug!("no coordinates in current weather, skipping air quality");
                None
            }
        };

        Ok(Fetched { current, entries, air })
    }

    async fn fetch_air_quality(&self, coords: Coordinates) -> Option<AirQualitySample> {
        let sample = self
            .api
            .air_quality(coords)
            .await
            .and_then(|payload| AirQualitySample::try_from(&payload));

        match sample {
            Ok(sample) => Some(sample),
            Err(err) => {
                warn!(error = %err, "air quality unavailable");
                None
            }
        }
    }

    fn complete(&self, result: Result<Fetched, WeatherError>, guard: LoadingGuard<'_>) -> SearchOutcome {
        match result {
            Ok(fetched) => {
                self.render(&fetched);
                guard.finish(AppStatus::Ready);
                SearchOutcome::Ready
            }
            Err(err) => {
                warn!(error = %err, "search failed");
                guard.finish(AppStatus::Error);
                self.notifier.show(&err.user_message(), ToastLevel::Error);
                SearchOutcome::Failed(err)
            }
        }
    }

    fn render(&self, fetched: &Fetched) {
        let mut display = self.display.lock();
        let days = display.daily_summaries(&fetched.entries);
        display.render_current(&fetched.current);
        display.render_hourly(&fetched.entries);
        display.render_daily(&days);
        if let Some(air) = &fetched.air {
            display.render_air_quality(air);
        }
    }

    fn remember(&self, city: &str) {
        let recent = {
            let mut state = self.state.lock();
            state.recent.push(city);
            state.recent.clone()
        };
        if let Err(err) = recent.save(self.store.lock().as_mut()) {
            warn!(error = %err, "recent searches not saved");
        }
    }
}

/// Re-search the most recent city every `every` until the future is
/// dropped. Ticks that land while a search is in flight are skipped.
pub async fn run_auto_refresh(app: &WeatherApp, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match app.refresh().await {
            Some(outcome) => debug!(?outcome, "auto refresh finished"),
            None => debug!("nothing to refresh yet"),
        }
    }
}

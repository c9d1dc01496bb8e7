//! Client state that survives across sessions: recent searches and theme.
//!
//! Values are JSON-encoded strings in a small key/value store, so the same
//! layout works for a browser-style store or a file on disk.

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::config::Theme;

pub const RECENT_SEARCHES_KEY: &str = "recentSearches";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const MAX_RECENT_SEARCHES: usize = 5;

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Key/value store persisted as one JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store; a missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not load saved state, starting fresh");
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    fn read(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(&self.values).context("Failed to encode state")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))
    }
}

/// Most-recent-first, deduplicated, capped list of searched cities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentSearches {
    cities: Vec<String>,
}

impl RecentSearches {
    pub fn from_vec(mut cities: Vec<String>) -> Self {
        let mut seen = Vec::with_capacity(cities.len());
        cities.retain(|c| {
            let fresh = !seen.contains(c);
            if fresh {
                seen.push(c.clone());
            }
            fresh
        });
        cities.truncate(MAX_RECENT_SEARCHES);
        Self { cities }
    }

    /// Move `city` to the front, dropping its older occurrence.
    pub fn push(&mut self, city: &str) {
        self.cities.retain(|c| c != city);
        self.cities.insert(0, city.to_string());
        self.cities.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn most_recent(&self) -> Option<&str> {
        self.cities.first().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.cities
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        let decoded = store
            .get(RECENT_SEARCHES_KEY)
            .and_then(|raw| match raw {
                Some(raw) => Ok(serde_json::from_str::<Vec<String>>(&raw)?),
                None => Ok(Vec::new()),
            });

        match decoded {
            Ok(cities) => Self::from_vec(cities),
            Err(err) => {
                warn!(error = %err, "recent searches could not be loaded");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        store.set(RECENT_SEARCHES_KEY, serde_json::to_string(&self.cities)?)
    }
}

/// Dark-mode flag; absent from the store means "follow the ambient preference".
pub fn load_dark_mode(store: &dyn KeyValueStore, ambient_dark: bool) -> bool {
    match store.get(DARK_MODE_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored theme preference is invalid");
            ambient_dark
        }),
        Ok(None) => ambient_dark,
        Err(err) => {
            warn!(error = %err, "theme preference could not be loaded");
            ambient_dark
        }
    }
}

pub fn save_dark_mode(store: &mut dyn KeyValueStore, dark: bool) -> Result<()> {
    store.set(DARK_MODE_KEY, serde_json::to_string(&dark)?)
}

/// Platform preference for the configured theme. For `Theme::System` the
/// terminal's `COLORFGBG` ("fg;bg") is consulted: backgrounds 0-6 and 8 are dark.
pub fn ambient_dark_mode(theme: Theme, colorfgbg: Option<&str>) -> bool {
    match theme {
        Theme::Dark => true,
        Theme::Light => false,
        Theme::System => colorfgbg
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok())
            .is_some_and(|bg| bg <= 6 || bg == 8),
    }
}

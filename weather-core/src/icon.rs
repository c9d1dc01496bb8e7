//! Condition keyword to display glyph.

/// Upstream condition keywords with a dedicated glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
}

pub const DEFAULT_GLYPH: &str = "⛅";

impl Condition {
    pub const fn all() -> &'static [Condition] {
        &[
            Condition::Clear,
            Condition::Clouds,
            Condition::Rain,
            Condition::Drizzle,
            Condition::Thunderstorm,
            Condition::Snow,
            Condition::Mist,
            Condition::Smoke,
            Condition::Haze,
            Condition::Dust,
            Condition::Fog,
            Condition::Sand,
            Condition::Ash,
            Condition::Squall,
            Condition::Tornado,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Clouds => "Clouds",
            Condition::Rain => "Rain",
            Condition::Drizzle => "Drizzle",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Snow => "Snow",
            Condition::Mist => "Mist",
            Condition::Smoke => "Smoke",
            Condition::Haze => "Haze",
            Condition::Dust => "Dust",
            Condition::Fog => "Fog",
            Condition::Sand => "Sand",
            Condition::Ash => "Ash",
            Condition::Squall => "Squall",
            Condition::Tornado => "Tornado",
        }
    }

    /// Keywords are matched exactly, as the provider sends them.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == keyword)
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Condition::Clear => "☀️",
            Condition::Clouds => "⛅",
            Condition::Rain => "🌧️",
            Condition::Drizzle => "🌦️",
            Condition::Thunderstorm => "⛈️",
            Condition::Snow => "❄️",
            Condition::Mist
            | Condition::Smoke
            | Condition::Haze
            | Condition::Dust
            | Condition::Fog
            | Condition::Sand
            | Condition::Ash => "🌫️",
            Condition::Squall => "💨",
            Condition::Tornado => "🌪️",
        }
    }
}

/// Glyph for a condition keyword; unknown keywords get [`DEFAULT_GLYPH`].
pub fn icon_for(keyword: &str) -> &'static str {
    Condition::from_keyword(keyword).map_or(DEFAULT_GLYPH, |c| c.glyph())
}

use thiserror::Error;

/// Errors produced by the API client, input validation and the controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// Empty or otherwise unacceptable user input. Never reaches the network.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The weather service could not be reached (DNS, connect, timeout).
    #[error("could not reach the weather service: {0}")]
    Transport(String),

    /// The weather service answered with a non-success HTTP status.
    #[error("weather service responded with {status_code} {status_text}")]
    Upstream { status_code: u16, status_text: String },

    /// The response body could not be decoded.
    #[error("could not decode weather service response: {0}")]
    Parse(String),

    /// Geocoding returned zero matches.
    #[error("no location found matching '{0}'")]
    GeocodeNotFound(String),

    /// Direct mode was requested without a credential.
    #[error(
        "No API key configured for OpenWeather.\n\
         Hint: run `weather configure` or set OPENWEATHER_API_KEY."
    )]
    MissingApiKey,

    /// The requested feature is switched off in the configuration.
    #[error("{0} is disabled in the configuration")]
    Unavailable(&'static str),
}

impl WeatherError {
    pub fn upstream(status: reqwest::StatusCode) -> Self {
        Self::Upstream {
            status_code: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// One human-readable sentence suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => reason.clone(),
            Self::Transport(_) => {
                "Weather service is unreachable. Check your connection and try again.".to_string()
            }
            Self::Upstream { status_code: 404, .. } => {
                "City not found. Check the spelling and try again.".to_string()
            }
            Self::Upstream { status_code: 401, .. } => {
                "The weather service rejected the API key.".to_string()
            }
            Self::Upstream { status_code: 429, .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            Self::Upstream { status_code, .. } if *status_code >= 500 => {
                "The weather service is temporarily unavailable.".to_string()
            }
            Self::Upstream { status_code, status_text } => {
                format!("Weather data could not be retrieved ({status_code} {status_text}).")
            }
            Self::Parse(_) => "Received unexpected data from the weather service.".to_string(),
            Self::GeocodeNotFound(query) => format!("No location found for '{query}'."),
            Self::MissingApiKey => "API key is missing. Run `weather configure` first.".to_string(),
            Self::Unavailable(feature) => format!("{feature} is turned off."),
        }
    }
}

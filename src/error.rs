//! Error types and handling for the citycast service

use std::fmt;

use thiserror::Error;
use tracing::error;

/// Outbound provider call a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// City name to coordinates
    Geocode,
    /// Coordinates to multi-day forecast
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Geocode => f.write_str("geocode"),
            Stage::Forecast => f.write_str("forecast"),
        }
    }
}

/// Body of every failed weather request
pub const WEATHER_LOOKUP_FAILED: &str = "Error retrieving weather data";

fn provider_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

/// Main error type for the citycast service
#[derive(Error, Debug)]
pub enum CitycastError {
    /// The assembled provider URL is not a valid absolute http(s) URL
    #[error("Invalid {stage} query: {reason}")]
    InvalidQuery { stage: Stage, reason: String },

    /// The provider answered with a non-success status
    #[error("Error fetching {stage} data: {status} {status_text}{}", provider_detail(.detail))]
    ProviderHttp {
        stage: Stage,
        status: u16,
        status_text: String,
        detail: Option<String>,
    },

    /// The provider did not answer within the configured bound
    #[error("{stage} request timed out after {timeout_secs}s")]
    ProviderTimeout { stage: Stage, timeout_secs: u64 },

    /// Connection-level failure before any status was received
    #[error("{stage} request failed: {message}")]
    Transport { stage: Stage, message: String },

    /// The provider body was not the JSON shape we expect
    #[error("Invalid {stage} payload: {message}")]
    InvalidPayload { stage: Stage, message: String },

    /// The provider understood the request but returned nothing
    #[error("No {stage} data found")]
    EmptyResponse { stage: Stage },

    /// The matched geocode candidate lacks latitude or longitude
    #[error("Coordinates not found in location data for '{city}'")]
    MissingCoordinates { city: String },

    /// A forecast reading lacks an expected nested field
    #[error("Malformed forecast reading #{index}: {reason}")]
    MalformedForecastReading { index: usize, reason: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Search history store errors
    #[error("History error: {message}")]
    History { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CitycastError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new history error
    pub fn history<S: Into<String>>(message: S) -> Self {
        Self::History {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used as a structured log field
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            CitycastError::InvalidQuery { .. } => "INVALID_QUERY",
            CitycastError::ProviderHttp { .. } => "PROVIDER_HTTP_ERROR",
            CitycastError::ProviderTimeout { .. } => "PROVIDER_TIMEOUT",
            CitycastError::Transport { .. } => "PROVIDER_UNREACHABLE",
            CitycastError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            CitycastError::EmptyResponse { .. } => "EMPTY_RESPONSE",
            CitycastError::MissingCoordinates { .. } => "MISSING_COORDINATES",
            CitycastError::MalformedForecastReading { .. } => "MALFORMED_FORECAST_READING",
            CitycastError::Validation { .. } => "VALIDATION",
            CitycastError::Config { .. } => "CONFIG",
            CitycastError::History { .. } => "HISTORY",
            CitycastError::Io { .. } => "IO",
        }
    }

    /// Provider stage the failure belongs to, if any
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CitycastError::InvalidQuery { stage, .. }
            | CitycastError::ProviderHttp { stage, .. }
            | CitycastError::ProviderTimeout { stage, .. }
            | CitycastError::Transport { stage, .. }
            | CitycastError::InvalidPayload { stage, .. }
            | CitycastError::EmptyResponse { stage } => Some(*stage),
            CitycastError::MissingCoordinates { .. } => Some(Stage::Geocode),
            CitycastError::MalformedForecastReading { .. } => Some(Stage::Forecast),
            _ => None,
        }
    }

    /// Whether the error was raised by the lookup pipeline (query, provider, parsing)
    #[must_use]
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            CitycastError::InvalidQuery { .. }
                | CitycastError::ProviderHttp { .. }
                | CitycastError::ProviderTimeout { .. }
                | CitycastError::Transport { .. }
                | CitycastError::InvalidPayload { .. }
                | CitycastError::EmptyResponse { .. }
                | CitycastError::MissingCoordinates { .. }
                | CitycastError::MalformedForecastReading { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            _ if self.is_pipeline_failure() => WEATHER_LOOKUP_FAILED.to_string(),
            CitycastError::Validation { message } => message.clone(),
            CitycastError::Config { .. } => {
                "Configuration error. Please check the provider base URL and API key.".to_string()
            }
            CitycastError::History { .. } | CitycastError::Io { .. } => {
                "Error retrieving search history".to_string()
            }
            _ => "Internal error".to_string(),
        }
    }
}

/// Log a failure with its code and stage at the point where it is raised
pub(crate) fn log_failure(err: &CitycastError) {
    match err.stage() {
        Some(stage) => error!(code = err.code(), stage = %stage, "{}", err),
        None => error!(code = err.code(), "{}", err),
    }
}

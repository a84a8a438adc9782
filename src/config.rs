//! Configuration management for the citycast service
//!
//! Handles loading configuration from defaults, an optional TOML file and
//! environment variables, and provides validation for all settings.

use crate::CitycastError;
use crate::models::Units;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use url::Url;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "citycast.toml";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CitycastConfig {
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Search history configuration
    #[serde(default)]
    pub history: HistoryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Provider base URL, e.g. `https://api.openweathermap.org`
    #[serde(default)]
    pub base_url: String,
    /// Provider API key
    #[serde(default)]
    pub api_key: String,
    /// Unit system requested from the provider
    #[serde(default)]
    pub units: Units,
    /// Per-request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory with the front-end build, served for non-API paths
    #[serde(default)]
    pub static_dir: Option<String>,
}

/// Search history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path of the JSON history file
    #[serde(default = "default_history_path")]
    pub path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_weather_timeout() -> u64 {
    10
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3001
}

fn default_history_path() -> String {
    "db/searchHistory.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            units: Units::default(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CitycastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path.
    ///
    /// Precedence, lowest first: built-in defaults (the provider URL and key
    /// fall back to `API_BASE_URL` / `API_KEY`), the TOML file, then
    /// `CITYCAST_*` variables such as `CITYCAST_WEATHER__UNITS=metric`.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("weather.base_url", env::var("API_BASE_URL").unwrap_or_default())?
            .set_default("weather.api_key", env::var("API_KEY").unwrap_or_default())?;

        // An explicitly named file must exist; the default one is optional
        let (config_file, required) = match config_path {
            Some(path) => (path, true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        builder = builder.add_source(
            File::from(config_file)
                .required(required)
                .format(FileFormat::Toml),
        );

        builder = builder.add_source(
            Environment::with_prefix("CITYCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CitycastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to blank configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.history.path.is_empty() {
            self.history.path = default_history_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        self.weather.base_url = self.weather.base_url.trim().to_string();
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Fail fast when the provider cannot possibly be reached.
    ///
    /// Not part of [`validate`](Self::validate): the library tolerates empty
    /// values and reports them per lookup as `InvalidQuery`.
    pub fn validate_provider(&self) -> Result<()> {
        if self.weather.base_url.is_empty() {
            return Err(CitycastError::config(
                "Weather API base URL is not set (API_BASE_URL or CITYCAST_WEATHER__BASE_URL)",
            )
            .into());
        }

        if self.weather.api_key.trim().is_empty() {
            return Err(CitycastError::config(
                "Weather API key is not set (API_KEY or CITYCAST_WEATHER__API_KEY)",
            )
            .into());
        }

        let url = Url::parse(&self.weather.base_url).map_err(|e| {
            CitycastError::config(format!(
                "Weather API base URL '{}' is invalid: {e}",
                self.weather.base_url
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CitycastError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                CitycastError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CitycastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CitycastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

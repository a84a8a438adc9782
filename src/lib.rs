//! `citycast` - city weather lookup
//!
//! Resolves a city name to coordinates, fetches the provider's five day
//! forecast and reduces it to one record per calendar day. Also ships the
//! HTTP API and the search-history store used by the server binary.

pub mod api;
pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod location_resolver;
pub mod models;
pub mod provider;
pub mod query;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::CitycastConfig;
pub use error::{CitycastError, Stage};
pub use history::{City, JsonFileHistory, SearchHistory};
pub use location_resolver::{LocationResolver, LookupContext};
pub use models::{Coordinates, DailyWeatherRecord, Units};
pub use provider::ProviderClient;
pub use query::QueryBuilder;
pub use weather::WeatherService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CitycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

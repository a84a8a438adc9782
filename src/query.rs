//! Outbound query construction for the geocode and forecast endpoints

use url::Url;

use crate::Result;
use crate::error::{CitycastError, Stage};
use crate::models::{Coordinates, Units};

/// Geocode results requested per lookup.
///
/// Only the provider's first match is ever used, so ambiguous names
/// (two cities called "Springfield") resolve to whichever one comes first.
pub const GEOCODE_RESULT_LIMIT: u8 = 1;

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const FORECAST_PATH: &str = "/data/2.5/forecast";

/// Builds and validates provider query URLs
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: String,
    api_key: String,
    units: Units,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, units: Units) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            units,
        }
    }

    #[must_use]
    pub fn units(&self) -> Units {
        self.units
    }

    /// `{base}/geo/1.0/direct?q={city}&limit=1&appid={key}`
    pub fn geocode_query(&self, city: &str) -> Result<Url> {
        let query = format!(
            "{}{}?q={}&limit={}&appid={}",
            self.base_url,
            GEOCODE_PATH,
            urlencoding::encode(city),
            GEOCODE_RESULT_LIMIT,
            urlencoding::encode(&self.api_key)
        );
        validate(Stage::Geocode, &query)
    }

    /// `{base}/data/2.5/forecast?lat={lat}&lon={lon}&units={units}&appid={key}`
    pub fn forecast_query(&self, coordinates: &Coordinates) -> Result<Url> {
        let query = format!(
            "{}{}?lat={}&lon={}&units={}&appid={}",
            self.base_url,
            FORECAST_PATH,
            coordinates.latitude,
            coordinates.longitude,
            self.units.as_query_value(),
            urlencoding::encode(&self.api_key)
        );
        validate(Stage::Forecast, &query)
    }
}

fn validate(stage: Stage, query: &str) -> Result<Url> {
    let url = Url::parse(query).map_err(|e| CitycastError::InvalidQuery {
        stage,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CitycastError::InvalidQuery {
            stage,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(CitycastError::InvalidQuery {
            stage,
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Query URL as a loggable string with the credential masked
#[must_use]
pub fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "appid" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted.to_string()
}

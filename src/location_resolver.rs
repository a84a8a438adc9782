//! Location Resolution Module
//!
//! This module turns a user-supplied city name into coordinates via the
//! provider's geocoding endpoint, and replaces the working city name with the
//! provider's canonical spelling.

use serde_json::Value;
use tracing::{debug, warn};

use crate::Result;
use crate::error::{CitycastError, Stage, log_failure};
use crate::models::{Coordinates, GeocodeCandidate};
use crate::provider::ProviderClient;
use crate::query::QueryBuilder;

/// Working state of one lookup.
///
/// Created per call and threaded through the pipeline by `&mut`, so concurrent
/// lookups never share a "current city".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupContext {
    /// Name exactly as the caller typed it
    pub requested: String,
    /// Working name; the provider's canonical name once geocoding matched
    pub city: String,
}

impl LookupContext {
    #[must_use]
    pub fn new(city: impl Into<String>) -> Self {
        let city = city.into();
        Self {
            requested: city.clone(),
            city,
        }
    }

    /// Whether the provider spelled the city differently from the caller
    #[must_use]
    pub fn was_canonicalized(&self) -> bool {
        self.requested != self.city
    }
}

/// Service for resolving city names
pub struct LocationResolver;

impl LocationResolver {
    /// Geocode `ctx.city` and return the first candidate's coordinates.
    ///
    /// `ctx.city` is overwritten with the candidate's name before coordinates
    /// are extracted, so a `MissingCoordinates` failure already carries the
    /// canonical name.
    pub async fn resolve(
        client: &ProviderClient,
        queries: &QueryBuilder,
        ctx: &mut LookupContext,
    ) -> Result<Coordinates> {
        debug!("Geocoding location name: {}", ctx.city);

        let query = queries.geocode_query(&ctx.city).inspect_err(log_failure)?;
        let payload = client.get_json(Stage::Geocode, &query).await?;
        let candidate = first_candidate(payload).inspect_err(log_failure)?;

        if let Some(name) = candidate.canonical_name() {
            ctx.city = name.to_string();
        } else {
            warn!(
                "Geocode match for '{}' has no name, keeping the requested one",
                ctx.requested
            );
        }

        let coordinates = candidate
            .coordinates()
            .ok_or_else(|| CitycastError::MissingCoordinates {
                city: ctx.city.clone(),
            })
            .inspect_err(log_failure)?;

        debug!("Found location: {} ({})", ctx.city, coordinates);
        Ok(coordinates)
    }
}

/// Use the first (and, with a result limit of 1, only) match
fn first_candidate(payload: Value) -> Result<GeocodeCandidate> {
    let Value::Array(candidates) = payload else {
        return Err(CitycastError::InvalidPayload {
            stage: Stage::Geocode,
            message: "expected a JSON array of locations".to_string(),
        });
    };

    let first = candidates
        .into_iter()
        .next()
        .ok_or(CitycastError::EmptyResponse {
            stage: Stage::Geocode,
        })?;

    serde_json::from_value(first).map_err(|e| CitycastError::InvalidPayload {
        stage: Stage::Geocode,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Units;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn resolve_against(body: Value, city: &str) -> (Result<Coordinates>, LookupContext) {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ProviderClient::new(Duration::from_secs(5)).unwrap();
        let queries = QueryBuilder::new(mock_server.uri(), "test_key", Units::Imperial);
        let mut ctx = LookupContext::new(city);
        let result = LocationResolver::resolve(&client, &queries, &mut ctx).await;
        (result, ctx)
    }

    #[tokio::test]
    async fn test_resolve_canonicalizes_name() {
        let (result, ctx) = resolve_against(
            json!([{"name": "London", "lat": "51.51", "lon": "-0.13", "country": "GB"}]),
            "london",
        )
        .await;

        assert_eq!(result.unwrap(), Coordinates::new("51.51", "-0.13"));
        assert_eq!(ctx.city, "London");
        assert_eq!(ctx.requested, "london");
        assert!(ctx.was_canonicalized());
    }

    #[tokio::test]
    async fn test_resolve_missing_lon_keeps_canonical_name() {
        let (result, ctx) =
            resolve_against(json!([{"name": "Springfield", "lat": 39.8}]), "springfield").await;

        match result.unwrap_err() {
            CitycastError::MissingCoordinates { city } => assert_eq!(city, "Springfield"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ctx.city, "Springfield");
    }

    #[tokio::test]
    async fn test_resolve_nameless_candidate_keeps_input() {
        let (result, ctx) = resolve_against(json!([{"lat": 1.5, "lon": 2.5}]), "Atlantis").await;

        assert_eq!(result.unwrap(), Coordinates::new("1.5", "2.5"));
        assert_eq!(ctx.city, "Atlantis");
        assert!(!ctx.was_canonicalized());
    }

    #[tokio::test]
    async fn test_resolve_empty_array() {
        let (result, ctx) = resolve_against(json!([]), "Nowhereville").await;
        assert!(matches!(
            result.unwrap_err(),
            CitycastError::EmptyResponse {
                stage: Stage::Geocode
            }
        ));
        assert_eq!(ctx.city, "Nowhereville");
    }

    #[tokio::test]
    async fn test_resolve_rejects_non_array_payload() {
        let (result, _) = resolve_against(json!({"cod": "200", "name": "London"}), "London").await;
        assert!(matches!(
            result.unwrap_err(),
            CitycastError::InvalidPayload { .. }
        ));
    }

    #[tokio::test]
    async fn test_resolve_invalid_query_makes_no_request() {
        let client = ProviderClient::new(Duration::from_secs(5)).unwrap();
        let queries = QueryBuilder::new("", "", Units::Imperial);
        let mut ctx = LookupContext::new("London");

        let err = LocationResolver::resolve(&client, &queries, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CitycastError::InvalidQuery {
                stage: Stage::Geocode,
                ..
            }
        ));
    }
}

//! City weather lookup
//!
//! Entry point of the pipeline: resolve the city, fetch the five day forecast
//! for its coordinates and reduce it to one record per day.

use std::time::Duration;

use serde_json::Value;
use tracing::{Instrument, debug, info, info_span};

use crate::Result;
use crate::config::WeatherConfig;
use crate::error::{CitycastError, Stage, log_failure};
use crate::forecast;
use crate::location_resolver::{LocationResolver, LookupContext};
use crate::models::DailyWeatherRecord;
use crate::provider::ProviderClient;
use crate::query::QueryBuilder;

/// Weather lookup service.
///
/// Holds only immutable collaborators; share one instance behind an `Arc`.
#[derive(Debug, Clone)]
pub struct WeatherService {
    queries: QueryBuilder,
    client: ProviderClient,
}

impl WeatherService {
    /// Build the service from the `[weather]` configuration section.
    ///
    /// An empty base URL or key is accepted here; the first lookup then fails
    /// with `InvalidQuery` (or a provider 401).
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let queries = QueryBuilder::new(&config.base_url, &config.api_key, config.units);
        let client = ProviderClient::new(Duration::from_secs(config.timeout_seconds))?;
        Ok(Self::with_parts(queries, client))
    }

    #[must_use]
    pub fn with_parts(queries: QueryBuilder, client: ProviderClient) -> Self {
        Self { queries, client }
    }

    /// Look up the daily forecast for `city`.
    ///
    /// Every record carries the provider's canonical city name. Any failure
    /// aborts the whole lookup; partial results are never returned.
    pub async fn lookup(&self, city: &str) -> Result<Vec<DailyWeatherRecord>> {
        let city = city.trim();
        if city.is_empty() {
            return Err(CitycastError::validation("City name is required"));
        }

        let span = info_span!("lookup", requested = %city, city = tracing::field::Empty);
        self.run_lookup(LookupContext::new(city))
            .instrument(span)
            .await
    }

    async fn run_lookup(&self, mut ctx: LookupContext) -> Result<Vec<DailyWeatherRecord>> {
        info!("Getting weather for city: '{}'", ctx.requested);

        let coordinates = LocationResolver::resolve(&self.client, &self.queries, &mut ctx).await?;
        tracing::Span::current().record("city", ctx.city.as_str());

        let query = self
            .queries
            .forecast_query(&coordinates)
            .inspect_err(log_failure)?;
        let payload = self.client.get_json(Stage::Forecast, &query).await?;

        let list = forecast_list(&payload).inspect_err(log_failure)?;
        let readings = forecast::parse_readings(list).inspect_err(log_failure)?;
        let records = forecast::reduce(&ctx.city, &readings, self.queries.units())
            .inspect_err(log_failure)?;

        if let Some(today) = records.first() {
            debug!(
                "Today in {}: {} {}",
                today.city,
                today.format_temperature(),
                today.icon_description
            );
        }
        info!(
            "Built {}-day forecast for '{}' from {} readings",
            records.len(),
            ctx.city,
            readings.len()
        );

        Ok(records)
    }
}

/// The `list` array of the forecast payload; must be present and non-empty
fn forecast_list(payload: &Value) -> Result<&[Value]> {
    let list = payload
        .get("list")
        .and_then(Value::as_array)
        .ok_or_else(|| CitycastError::InvalidPayload {
            stage: Stage::Forecast,
            message: "missing 'list' array".to_string(),
        })?;

    if list.is_empty() {
        return Err(CitycastError::EmptyResponse {
            stage: Stage::Forecast,
        });
    }

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Units;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_errors() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    #[test]
    fn test_forecast_list_requires_list() {
        let err = forecast_list(&json!({"cod": "200"})).unwrap_err();
        assert!(matches!(err, CitycastError::InvalidPayload { .. }));

        let err = forecast_list(&json!({"list": "nope"})).unwrap_err();
        assert!(matches!(err, CitycastError::InvalidPayload { .. }));
    }

    #[test]
    fn test_forecast_list_empty_is_empty_response() {
        let err = forecast_list(&json!({"list": []})).unwrap_err();
        assert!(matches!(
            err,
            CitycastError::EmptyResponse {
                stage: Stage::Forecast
            }
        ));
    }

    #[tokio::test]
    async fn test_blank_city_is_rejected_before_any_request() {
        let service = WeatherService::new(&WeatherConfig::default()).unwrap();
        let err = service.lookup("   ").await.unwrap_err();
        assert!(matches!(err, CitycastError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails_with_invalid_query() {
        let service = WeatherService::new(&WeatherConfig::default()).unwrap();
        let err = service.lookup("London").await.unwrap_err();
        assert!(matches!(
            err,
            CitycastError::InvalidQuery {
                stage: Stage::Geocode,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_query_is_logged() {
        let (logs, _guard) = capture_errors();

        let service = WeatherService::new(&WeatherConfig::default()).unwrap();
        service.lookup("London").await.unwrap_err();

        let output = logs.contents();
        assert!(output.contains("ERROR"), "captured: {output}");
        assert!(output.contains("INVALID_QUERY"), "captured: {output}");
        assert!(output.contains("geocode"), "captured: {output}");
    }

    #[tokio::test]
    async fn test_malformed_reading_is_logged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "London", "lat": 51.51, "lon": -0.13}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{"dt_txt": "2024-01-15 12:00:00", "weather": [{"icon": "10d", "description": "light rain"}]}]
            })))
            .mount(&server)
            .await;

        let service = WeatherService::new(&WeatherConfig {
            base_url: server.uri(),
            api_key: "test_key".to_string(),
            units: Units::Imperial,
            timeout_seconds: 5,
        })
        .unwrap();

        let (logs, _guard) = capture_errors();
        let err = service.lookup("London").await.unwrap_err();
        assert!(matches!(
            err,
            CitycastError::MalformedForecastReading { index: 0, .. }
        ));

        let output = logs.contents();
        assert!(output.contains("ERROR"), "captured: {output}");
        assert!(
            output.contains("MALFORMED_FORECAST_READING"),
            "captured: {output}"
        );
        assert!(output.contains("forecast"), "captured: {output}");
    }
}

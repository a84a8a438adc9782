//! HTTP client for the weather provider
//!
//! Issues a single GET per query, turns non-success statuses, timeouts and
//! empty payloads into typed errors, and logs every failure before returning it.
//! There is no retry: one failed call is terminal for the lookup.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::Result;
use crate::error::{CitycastError, Stage, log_failure};
use crate::query::redact;

const USER_AGENT: &str = concat!("citycast/", env!("CARGO_PKG_VERSION"));

/// Weather provider client
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    timeout: Duration,
}

impl ProviderClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CitycastError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// GET `url` and return the parsed JSON body
    #[instrument(name = "provider_request", skip(self, stage, url), fields(stage = %stage, url = %redact(url)))]
    pub async fn get_json(&self, stage: Stage, url: &Url) -> Result<Value> {
        let started = Instant::now();

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return Err(self.log_failure(self.transport_error(stage, &e))),
        };

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            started.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| provider_message(&body));

            return Err(self.log_failure(CitycastError::ProviderHttp {
                stage,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
                detail,
            }));
        }

        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) if e.is_timeout() => {
                return Err(self.log_failure(self.transport_error(stage, &e)));
            }
            Err(e) => {
                return Err(self.log_failure(CitycastError::InvalidPayload {
                    stage,
                    message: describe(&e),
                }));
            }
        };

        if is_empty_payload(&payload) {
            return Err(self.log_failure(CitycastError::EmptyResponse { stage }));
        }

        if started.elapsed().as_secs() > 5 {
            warn!(
                "Slow {} response: {:.3}s",
                stage,
                started.elapsed().as_secs_f64()
            );
        }

        Ok(payload)
    }

    fn transport_error(&self, stage: Stage, e: &reqwest::Error) -> CitycastError {
        if e.is_timeout() {
            CitycastError::ProviderTimeout {
                stage,
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            CitycastError::Transport {
                stage,
                message: describe(&e),
            }
        }
    }

    fn log_failure(&self, err: CitycastError) -> CitycastError {
        log_failure(&err);
        err
    }
}

/// reqwest errors print the request URL, which carries the API key
fn describe(e: &reqwest::Error) -> String {
    match e.url() {
        Some(url) => e.to_string().replace(url.as_str(), &redact(url)),
        None => e.to_string(),
    }
}

/// `null`, `[]` and `{}` all mean the provider found nothing
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// OpenWeather error bodies look like `{"cod": 401, "message": "Invalid API key"}`
fn provider_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ProviderClient {
        ProviderClient::new(Duration::from_secs(5)).unwrap()
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}?appid=test_key", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "London", "lat": 51.51, "lon": -0.13}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let payload = client()
            .get_json(Stage::Geocode, &url(&mock_server, "/geo/1.0/direct"))
            .await
            .unwrap();
        assert_eq!(payload[0]["name"], "London");
    }

    #[tokio::test]
    async fn test_non_success_status_surfaces_status_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"cod": 401, "message": "Invalid API key"})),
            )
            .mount(&mock_server)
            .await;

        let err = client()
            .get_json(Stage::Forecast, &url(&mock_server, "/data/2.5/forecast"))
            .await
            .unwrap_err();

        match err {
            CitycastError::ProviderHttp {
                stage,
                status,
                status_text,
                detail,
            } => {
                assert_eq!(stage, Stage::Forecast);
                assert_eq!(status, 401);
                assert_eq!(status_text, "Unauthorized");
                assert_eq!(detail.as_deref(), Some("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let err = client()
            .get_json(Stage::Geocode, &url(&mock_server, "/geo/1.0/direct"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CitycastError::ProviderHttp {
                status: 503,
                detail: None,
                ..
            }
        ));
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_empty_payloads() {
        for body in [json!([]), json!({}), Value::Null] {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&mock_server)
                .await;

            let err = client()
                .get_json(Stage::Geocode, &url(&mock_server, "/geo/1.0/direct"))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                CitycastError::EmptyResponse {
                    stage: Stage::Geocode
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let err = client()
            .get_json(Stage::Forecast, &url(&mock_server, "/data/2.5/forecast"))
            .await
            .unwrap_err();
        assert!(matches!(err, CitycastError::InvalidPayload { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"name": "Slow"}]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = ProviderClient::new(Duration::from_millis(100)).unwrap();
        let err = client
            .get_json(Stage::Geocode, &url(&mock_server, "/geo/1.0/direct"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CitycastError::ProviderTimeout {
                stage: Stage::Geocode,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        // Nothing listens on port 9 (discard) in the test environment
        let url = Url::parse("http://127.0.0.1:9/geo/1.0/direct?appid=secret_key").unwrap();
        let err = client().get_json(Stage::Geocode, &url).await.unwrap_err();
        assert!(matches!(
            err,
            CitycastError::Transport { .. } | CitycastError::ProviderTimeout { .. }
        ));
        assert!(!err.to_string().contains("secret_key"));
    }

    #[test]
    fn test_is_empty_payload() {
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!({})));
        assert!(is_empty_payload(&Value::Null));
        assert!(!is_empty_payload(&json!([{}])));
        assert!(!is_empty_payload(&json!({"list": []})));
    }
}

//! JSON API routes
//!
//! `POST /weather` runs a lookup and bookmarks the canonical city name,
//! `/weather/history` lists and deletes bookmarks.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{CitycastError, WEATHER_LOOKUP_FAILED};
use crate::history::{City, SearchHistory};
use crate::models::DailyWeatherRecord;
use crate::weather::WeatherService;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherService>,
    pub history: Arc<dyn SearchHistory>,
}

impl AppState {
    pub fn new(weather: WeatherService, history: impl SearchHistory + 'static) -> Self {
        Self {
            weather: Arc::new(weather),
            history: Arc::new(history),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRequest {
    pub city_name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/weather", post(get_weather))
        .route("/weather/history", get(get_history))
        .route("/weather/history/{id}", delete(delete_history))
}

impl IntoResponse for CitycastError {
    fn into_response(self) -> Response {
        let status = match &self {
            CitycastError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(code = self.code(), "Request failed: {}", self);
        }

        (status, self.user_message()).into_response()
    }
}

async fn get_weather(
    State(state): State<AppState>,
    payload: Result<Json<WeatherRequest>, JsonRejection>,
) -> Result<Response, CitycastError> {
    info!("POST request received for weather data");

    // A missing or unreadable body is treated as a request without a city
    let request = payload.map(|Json(request)| request).unwrap_or_else(|rejection| {
        debug!("Unreadable weather request body: {}", rejection);
        WeatherRequest::default()
    });

    let city_name = request
        .city_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| CitycastError::validation("City name is required"))?;

    let records: Vec<DailyWeatherRecord> = state.weather.lookup(&city_name).await?;

    // Bookmark the provider's spelling, not the raw input
    if let Some(first) = records.first() {
        info!("Updating the history: {}", first.city);
        if let Err(e) = state.history.add(&first.city).await {
            error!(
                code = e.code(),
                "Failed to record '{}' in search history: {}", first.city, e
            );
            return Ok((StatusCode::INTERNAL_SERVER_ERROR, WEATHER_LOOKUP_FAILED).into_response());
        }
    }

    Ok(Json(records).into_response())
}

async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<City>>, CitycastError> {
    info!("GET request received for history");
    let cities = state.history.list().await?;
    Ok(Json(cities))
}

async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, &'static str), CitycastError> {
    info!("DELETE request received for history id: {}", id);

    if state.history.remove(&id).await? {
        Ok((StatusCode::OK, "City deleted"))
    } else {
        warn!("History id {} not found", id);
        Ok((StatusCode::NOT_FOUND, "City not found"))
    }
}

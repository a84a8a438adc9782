//! Daily forecast reduction
//!
//! The provider returns a reading every three hours for five days. This module
//! keeps the first reading of every calendar date and turns it into a
//! [`DailyWeatherRecord`]. Later readings of the same date are dropped, not
//! averaged, and dates stay in the order the provider sent them.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::error::CitycastError;
use crate::models::{DailyWeatherRecord, RawForecastReading, Units};

/// Presentation format for record dates
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const PROVIDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape-check the provider's `list` array into typed readings
pub fn parse_readings(list: &[Value]) -> Result<Vec<RawForecastReading>> {
    list.iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value.clone()).map_err(|e| {
                CitycastError::MalformedForecastReading {
                    index,
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

/// Reduce the raw series to one record per distinct calendar date
pub fn reduce(
    city: &str,
    readings: &[RawForecastReading],
    units: Units,
) -> Result<Vec<DailyWeatherRecord>> {
    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let mut records = Vec::new();

    for (index, raw) in readings.iter().enumerate() {
        let reading = ParsedReading::parse(index, raw)?;
        let date = reading.timestamp.date();

        if !seen.insert(date) {
            continue;
        }

        records.push(DailyWeatherRecord {
            city: city.to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            icon: reading.icon,
            icon_description: reading.description,
            temperature: reading.temperature,
            units,
            wind_speed: reading.wind_speed,
            humidity: reading.humidity,
        });
    }

    debug!(
        "Reduced {} readings to {} daily records for {}",
        readings.len(),
        records.len(),
        city
    );

    Ok(records)
}

/// A reading with every field the record needs
#[derive(Debug)]
struct ParsedReading {
    timestamp: NaiveDateTime,
    icon: String,
    description: String,
    temperature: f64,
    wind_speed: f64,
    humidity: u8,
}

impl ParsedReading {
    fn parse(index: usize, raw: &RawForecastReading) -> Result<Self> {
        let missing = |field: &str| CitycastError::MalformedForecastReading {
            index,
            reason: format!("missing {field}"),
        };

        let timestamp = reading_timestamp(index, raw)?;

        let condition = raw.weather.first().ok_or_else(|| missing("weather[0]"))?;
        let icon = condition
            .icon
            .clone()
            .ok_or_else(|| missing("weather[0].icon"))?;
        let description = condition
            .description
            .clone()
            .ok_or_else(|| missing("weather[0].description"))?;

        let main = raw.main.as_ref().ok_or_else(|| missing("main"))?;
        let temperature = main.temp.ok_or_else(|| missing("main.temp"))?;
        let humidity = main.humidity.ok_or_else(|| missing("main.humidity"))?;

        let wind_speed = raw
            .wind
            .as_ref()
            .ok_or_else(|| missing("wind"))?
            .speed
            .ok_or_else(|| missing("wind.speed"))?;

        Ok(Self {
            timestamp,
            icon,
            description,
            temperature,
            wind_speed,
            humidity,
        })
    }
}

/// `dt_txt` when present, otherwise the unix `dt`
fn reading_timestamp(index: usize, raw: &RawForecastReading) -> Result<NaiveDateTime> {
    if let Some(text) = raw.dt_txt.as_deref() {
        return NaiveDateTime::parse_from_str(text.trim(), PROVIDER_TIMESTAMP_FORMAT).map_err(
            |e| CitycastError::MalformedForecastReading {
                index,
                reason: format!("invalid dt_txt '{text}': {e}"),
            },
        );
    }

    raw.dt
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| CitycastError::MalformedForecastReading {
            index,
            reason: "missing dt_txt".to_string(),
        })
}

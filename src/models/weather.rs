//! Daily weather record and unit system

use serde::{Deserialize, Serialize};

/// Unit system requested from the provider; conversion happens provider-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin, metres per second
    Standard,
    /// Celsius, metres per second
    Metric,
    /// Fahrenheit, miles per hour
    #[default]
    Imperial,
}

impl Units {
    /// Value of the provider's `units` query parameter
    #[must_use]
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Temperature suffix for display
    #[must_use]
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Standard => "K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }
}

/// One representative reading per calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeatherRecord {
    /// Canonical city name returned by the geocoder
    pub city: String,
    /// Calendar date as `MM/DD/YYYY`
    pub date: String,
    /// Provider condition icon code
    pub icon: String,
    pub icon_description: String,
    pub temperature: f64,
    /// Unit system `temperature` and `wind_speed` are expressed in
    pub units: Units,
    pub wind_speed: f64,
    /// Relative humidity in percent
    pub humidity: u8,
}

impl DailyWeatherRecord {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}{}", self.temperature, self.units.temperature_symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_query_value() {
        assert_eq!(Units::default(), Units::Imperial);
        assert_eq!(Units::Imperial.as_query_value(), "imperial");
        assert_eq!(Units::Metric.as_query_value(), "metric");
        assert_eq!(Units::Standard.as_query_value(), "standard");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = DailyWeatherRecord {
            city: "London".to_string(),
            date: "01/15/2024".to_string(),
            icon: "10d".to_string(),
            icon_description: "light rain".to_string(),
            temperature: 44.6,
            units: Units::Imperial,
            wind_speed: 9.2,
            humidity: 81,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["iconDescription"], "light rain");
        assert_eq!(json["windSpeed"], 9.2);
        assert_eq!(json["units"], "imperial");
        assert_eq!(record.format_temperature(), "44.6°F");
    }
}

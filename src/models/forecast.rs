//! Raw forecast readings as delivered by the provider's 5 day / 3 hour endpoint
//!
//! Every nested field is optional here; presence is checked by the reducer so a
//! malformed payload can be reported with the reading index and field name.

use serde::{Deserialize, Serialize};

/// One provider sample, taken every three hours
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RawForecastReading {
    /// Unix timestamp in seconds (UTC)
    pub dt: Option<i64>,
    /// Same instant as text, `YYYY-MM-DD HH:MM:SS` (UTC)
    pub dt_txt: Option<String>,
    /// Condition list; only the first element is meaningful
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub main: Option<RawMain>,
    pub wind: Option<RawWind>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RawCondition {
    /// Short icon code such as `10d`
    pub icon: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RawMain {
    /// Temperature in the unit system requested in the query
    pub temp: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<u8>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RawWind {
    pub speed: Option<f64>,
}

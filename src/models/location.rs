//! Location models for geocoding results and coordinates

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Latitude/longitude pair in the provider's own textual rendering.
///
/// Values are embedded verbatim into the forecast query, so they are kept as
/// strings instead of being round-tripped through `f64`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// One entry of the geocode response array
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GeocodeCandidate {
    /// Provider's name for the matched place
    pub name: Option<String>,
    /// Latitude, number or string depending on the provider
    pub lat: Option<Value>,
    /// Longitude, number or string depending on the provider
    pub lon: Option<Value>,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
    /// State or region, when the provider has one
    pub state: Option<String>,
}

impl GeocodeCandidate {
    /// Canonical name, if the provider supplied a non-blank one
    #[must_use]
    pub fn canonical_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Both coordinates, or `None` when either one is absent, null, zero or blank
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        let latitude = coordinate_text(self.lat.as_ref()?)?;
        let longitude = coordinate_text(self.lon.as_ref()?)?;
        Some(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// Numeric zero counts as missing, the same as null or an empty string
fn coordinate_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

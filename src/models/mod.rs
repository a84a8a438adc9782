//! Data models for the citycast service
//!
//! This module contains the domain models organized by concern:
//! - Location: coordinates and geocode candidates
//! - Forecast: raw provider readings as they arrive on the wire
//! - Weather: the reduced per-day records handed back to callers

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{RawCondition, RawForecastReading, RawMain, RawWind};
pub use location::{Coordinates, GeocodeCandidate};
pub use weather::{DailyWeatherRecord, Units};

// Weather API response types.
// Geocoding results, One Call responses and the snapshot returned to callers.

use serde::{Deserialize, Serialize};

/// Resolved position of a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One entry of the direct geocoding response.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoLocation {
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<&GeoLocation> for Coordinates {
    fn from(location: &GeoLocation) -> Self {
        Coordinates {
            lat: location.lat,
            lon: location.lon,
        }
    }
}

/// One Call response, reduced to the part we serve.
#[derive(Debug, Clone, Deserialize)]
pub struct OneCallResponse {
    pub current: serde_json::Value,
}

/// Current weather for a caller-supplied location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// The location exactly as the caller spelled it.
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    /// The provider's "current" conditions object, passed through as-is.
    pub weather: serde_json::Value,
}

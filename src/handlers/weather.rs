// Current weather handler.
// Serves current conditions for a caller-supplied location through the cache.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::cache::{CacheHandle, with_cache};
use crate::error::Result;
use crate::secrets::SecretProvider;
use crate::weather::{WeatherSnapshot, WeatherSource};

use super::Response;

pub const FETCH_FAILED: &str = "Failed to fetch weather data";
pub const LOCATION_REQUIRED: &str = "location is required";

/// Invocation event: `{"body": {"location": "Seattle"}}`.
///
/// The body may also arrive as a JSON-encoded string, as API Gateway proxies send it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherEvent {
    #[serde(default)]
    pub body: Value,
}

impl WeatherEvent {
    pub fn for_location(location: impl Into<String>) -> Self {
        Self {
            body: serde_json::json!({ "location": location.into() }),
        }
    }

    /// The requested location, if present and not blank.
    pub fn location(&self) -> Option<String> {
        let body = match &self.body {
            Value::String(raw) => serde_json::from_str(raw).ok()?,
            other => other.clone(),
        };

        body.get("location")
            .and_then(Value::as_str)
            .filter(|location| !location.trim().is_empty())
            .map(str::to_string)
    }
}

/// Cache key for a location: case and surrounding whitespace do not matter.
pub fn weather_cache_key(location: &str) -> String {
    location.trim().to_lowercase()
}

pub struct WeatherHandler<'a> {
    pub source: &'a dyn WeatherSource,
    pub secrets: &'a SecretProvider,
    /// Name of the secret holding the weather API key.
    pub api_key_secret: &'a str,
    pub cache_name: &'a str,
}

impl WeatherHandler<'_> {
    pub async fn handle(&self, event: &WeatherEvent, cache: &CacheHandle) -> Response<WeatherSnapshot> {
        let Some(location) = event.location() else {
            return Response::error(400, LOCATION_REQUIRED);
        };

        let key = weather_cache_key(&location);
        match with_cache(cache, self.cache_name, &key, || self.fetch(&location)).await {
            Ok(snapshot) => Response::ok(snapshot),
            Err(e) => Response::from_error(&e, FETCH_FAILED),
        }
    }

    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot> {
        // Only needed on a miss.
        let api_key = self.secrets.get_secret(self.api_key_secret).await?;

        let coordinates = self.source.geocode(location, &api_key).await?;
        let weather = self.source.current(coordinates, &api_key).await?;
        info!(location, "Fetched current weather");

        Ok(WeatherSnapshot {
            location: location.to_string(),
            lat: coordinates.lat,
            lon: coordinates.lon,
            weather,
        })
    }
}

// OpenWeatherMap HTTP client.
// Resolves a location to coordinates and fetches its current conditions.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info};

use crate::error::{Result, SmallTalkError};

use super::types::{Coordinates, GeoLocation, OneCallResponse};

const SERVICE: &str = "OpenWeatherMap";
const EXCLUDED_PARTS: &str = "minutely,hourly,daily,alerts";

/// A source of geocoding and current conditions.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn geocode(&self, location: &str, api_key: &str) -> Result<Coordinates>;

    async fn current(&self, coordinates: Coordinates, api_key: &str) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    units: String,
}

impl OpenWeatherClient {
    pub fn new(client: Client, base_url: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            units: units.into(),
        }
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting {}", url);

        let response = self.client.get(&url).query(params).send().await?;
        Ok(check_response(response).await?.bytes().await?.to_vec())
    }
}

async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SmallTalkError::Upstream {
            service: SERVICE,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn geocode(&self, location: &str, api_key: &str) -> Result<Coordinates> {
        let body = self
            .get(
                "/geo/1.0/direct",
                &[("q", location), ("limit", "1"), ("appid", api_key)],
            )
            .await?;

        let matches: Vec<GeoLocation> = serde_json::from_slice(&body)?;
        let first = matches
            .first()
            .ok_or_else(|| SmallTalkError::NoCoordinates(location.to_string()))?;

        let coordinates = Coordinates::from(first);
        info!(
            location,
            lat = coordinates.lat,
            lon = coordinates.lon,
            "Resolved coordinates"
        );
        Ok(coordinates)
    }

    async fn current(&self, coordinates: Coordinates, api_key: &str) -> Result<serde_json::Value> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();
        let body = self
            .get(
                "/data/3.0/onecall",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("units", self.units.as_str()),
                    ("exclude", EXCLUDED_PARTS),
                    ("appid", api_key),
                ],
            )
            .await?;

        let response: OneCallResponse = serde_json::from_slice(&body)?;
        Ok(response.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoding_payload_shape() {
        let body = r#"[{"name":"Seattle","local_names":{"en":"Seattle"},"lat":47.6038321,"lon":-122.330062,"country":"US","state":"Washington"}]"#;
        let matches: Vec<GeoLocation> = serde_json::from_str(body).unwrap();

        let coordinates = Coordinates::from(&matches[0]);
        assert_eq!(coordinates.lat, 47.6038321);
        assert_eq!(coordinates.lon, -122.330062);
        assert_eq!(matches[0].country.as_deref(), Some("US"));
    }

    #[test]
    fn test_one_call_requires_current() {
        let body = r#"{"lat":47.6,"lon":-122.33,"timezone":"America/Los_Angeles","current":{"temp":51.8,"weather":[{"main":"Rain"}]}}"#;
        let response: OneCallResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.current["temp"], 51.8);

        assert!(serde_json::from_str::<OneCallResponse>(r#"{"lat":1.0}"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_upstream_error() {
        let client = OpenWeatherClient::new(Client::new(), "http://127.0.0.1:9", "imperial");

        let err = client.geocode("Seattle", "key").await.unwrap_err();
        assert!(err.is_upstream());
    }
}

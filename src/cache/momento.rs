// Momento cache service over the HTTP API.
// Handles credential decoding and maps HTTP responses to cache response variants.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Result, SmallTalkError};

use super::service::{CacheGet, CacheService, CacheSet};

/// Decoded Momento API key.
#[derive(Clone, PartialEq, Eq)]
pub struct MomentoCredential {
    /// HTTP API base URL, without trailing slash.
    pub base_url: String,
    pub token: String,
}

impl fmt::Debug for MomentoCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MomentoCredential")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Payload of a v1 API key (base64 JSON).
#[derive(Debug, Deserialize)]
struct V1ApiKey {
    endpoint: String,
    api_key: String,
}

impl MomentoCredential {
    /// Parse an API key as stored in the secret store.
    ///
    /// v1 keys carry their own endpoint; `endpoint_override` wins when set and
    /// is required for any other key format.
    pub fn parse(raw: &str, endpoint_override: Option<&str>) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SmallTalkError::Credential("API key is empty".into()));
        }

        let v1 = STANDARD
            .decode(raw)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<V1ApiKey>(&bytes).ok());

        match (v1, endpoint_override) {
            (Some(key), Some(endpoint)) => Ok(Self {
                base_url: normalize_endpoint(endpoint),
                token: key.api_key,
            }),
            (Some(key), None) => Ok(Self {
                base_url: normalize_endpoint(&key.endpoint),
                token: key.api_key,
            }),
            (None, Some(endpoint)) => Ok(Self {
                base_url: normalize_endpoint(endpoint),
                token: raw.to_string(),
            }),
            (None, None) => Err(SmallTalkError::Credential(
                "not a v1 API key and MOMENTO_HTTP_ENDPOINT is not set".into(),
            )),
        }
    }
}

/// Full URLs pass through; bare cell hostnames get the HTTP API prefix.
fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://api.cache.{endpoint}")
    }
}

/// Momento cache client.
#[derive(Debug, Clone)]
pub struct MomentoCache {
    client: Client,
    credential: MomentoCredential,
}

impl MomentoCache {
    pub fn new(client: Client, credential: MomentoCredential) -> Self {
        Self { client, credential }
    }

    /// `{base_url}/cache/{cache_name}`, with the cache name as one encoded segment.
    fn url(&self, cache_name: &str) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&self.credential.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|()| format!("{} cannot be a base URL", self.credential.base_url))?
            .pop_if_empty()
            .push("cache")
            .push(cache_name);
        Ok(url)
    }
}

#[async_trait]
impl CacheService for MomentoCache {
    async fn get(&self, cache_name: &str, key: &str) -> CacheGet {
        debug!(cache = cache_name, key, "Momento GET");

        let url = match self.url(cache_name) {
            Ok(url) => url,
            Err(e) => return CacheGet::Error(e),
        };
        let response = match self
            .client
            .get(url)
            .query(&[("key", key)])
            .header(AUTHORIZATION, &self.credential.token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CacheGet::Error(e.to_string()),
        };

        match response.status() {
            StatusCode::OK => match response.text().await {
                Ok(body) => CacheGet::Hit(body),
                Err(e) => CacheGet::Error(e.to_string()),
            },
            StatusCode::NOT_FOUND => CacheGet::Miss,
            status => CacheGet::Error(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )),
        }
    }

    async fn set(&self, cache_name: &str, key: &str, value: String, ttl: Duration) -> CacheSet {
        debug!(cache = cache_name, key, ttl_secs = ttl.as_secs(), "Momento PUT");

        let url = match self.url(cache_name) {
            Ok(url) => url,
            Err(e) => return CacheSet::Error(e),
        };
        let ttl_seconds = ttl.as_secs().max(1).to_string();
        let response = match self
            .client
            .put(url)
            .query(&[("key", key), ("ttl_seconds", ttl_seconds.as_str())])
            .header(AUTHORIZATION, &self.credential.token)
            .body(value)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CacheSet::Error(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            CacheSet::Success
        } else {
            CacheSet::Error(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            ))
        }
    }
}

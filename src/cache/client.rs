// Cache client construction.
// Builds per-invocation cache handles from the cache credential secret and a default TTL.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use crate::error::Result;
use crate::secrets::SecretProvider;

use super::memory::MemoryCache;
use super::momento::{MomentoCache, MomentoCredential};
use super::service::CacheService;

/// A configured cache service plus the TTL applied to every store.
#[derive(Clone)]
pub struct CacheClient {
    service: Arc<dyn CacheService>,
    default_ttl: Duration,
}

impl fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl CacheClient {
    pub fn new(service: Arc<dyn CacheService>, default_ttl: Duration) -> Self {
        Self {
            service,
            default_ttl,
        }
    }

    pub fn service(&self) -> &dyn CacheService {
        self.service.as_ref()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

/// Cache capability for one invocation.
#[derive(Debug, Clone, Default)]
pub enum CacheHandle {
    /// Caching is off for this invocation; every lookup misses, every store is dropped.
    #[default]
    Disabled,
    Enabled(CacheClient),
}

impl CacheHandle {
    pub fn enabled(service: Arc<dyn CacheService>, default_ttl: Duration) -> Self {
        CacheHandle::Enabled(CacheClient::new(service, default_ttl))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheHandle::Enabled(_))
    }
}

/// Turns a cache credential into a cache service.
pub trait CacheConnector: Send + Sync {
    /// Whether `connect` needs the credential secret at all.
    fn needs_credential(&self) -> bool {
        true
    }

    fn connect(&self, credential: &str) -> Result<Arc<dyn CacheService>>;
}

/// Connects to Momento over HTTP.
#[derive(Debug, Clone)]
pub struct MomentoConnector {
    client: Client,
    endpoint_override: Option<String>,
}

impl MomentoConnector {
    pub fn new(client: Client, endpoint_override: Option<String>) -> Self {
        Self {
            client,
            endpoint_override,
        }
    }
}

impl CacheConnector for MomentoConnector {
    fn connect(&self, credential: &str) -> Result<Arc<dyn CacheService>> {
        let credential = MomentoCredential::parse(credential, self.endpoint_override.as_deref())?;
        Ok(Arc::new(MomentoCache::new(self.client.clone(), credential)))
    }
}

/// Hands out one shared in-process cache; the credential is ignored.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    cache: Arc<MemoryCache>,
}

impl MemoryConnector {
    pub fn new(cache: Arc<MemoryCache>) -> Self {
        Self { cache }
    }
}

impl CacheConnector for MemoryConnector {
    fn needs_credential(&self) -> bool {
        false
    }

    fn connect(&self, _credential: &str) -> Result<Arc<dyn CacheService>> {
        Ok(self.cache.clone())
    }
}

/// Builds cache handles, degrading to `Disabled` on any failure.
pub struct CacheClientFactory {
    secrets: Arc<SecretProvider>,
    connector: Option<Arc<dyn CacheConnector>>,
    credential_secret: String,
}

impl CacheClientFactory {
    pub fn new(
        secrets: Arc<SecretProvider>,
        connector: Arc<dyn CacheConnector>,
        credential_secret: impl Into<String>,
    ) -> Self {
        Self {
            secrets,
            connector: Some(connector),
            credential_secret: credential_secret.into(),
        }
    }

    /// A factory that only ever hands out `Disabled`.
    pub fn disabled(secrets: Arc<SecretProvider>) -> Self {
        Self {
            secrets,
            connector: None,
            credential_secret: String::new(),
        }
    }

    /// Create a cache handle whose stores use `ttl`.
    pub async fn create(&self, ttl: Duration) -> CacheHandle {
        let Some(connector) = &self.connector else {
            return CacheHandle::Disabled;
        };

        match self.connect(connector.as_ref()).await {
            Ok(service) => {
                info!(ttl_secs = ttl.as_secs(), "Cache client ready");
                CacheHandle::enabled(service, ttl)
            }
            Err(e) => {
                error!("Failed to create cache client, caching disabled: {e}");
                CacheHandle::Disabled
            }
        }
    }

    async fn connect(&self, connector: &dyn CacheConnector) -> Result<Arc<dyn CacheService>> {
        if !connector.needs_credential() {
            return connector.connect("");
        }

        let credential = self.secrets.get_secret(&self.credential_secret).await?;
        connector.connect(&credential)
    }
}

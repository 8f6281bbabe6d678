// Typed cache access.
// JSON get/set over a cache handle; cache failures are logged and never surfaced.

use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, info, warn};

use super::client::CacheHandle;
use super::service::{CacheGet, CacheSet};

impl CacheHandle {
    /// Look up `key` and decode it as JSON.
    ///
    /// Misses, service errors and undecodable values all come back as `None`.
    pub async fn get<T: DeserializeOwned>(&self, cache_name: &str, key: &str) -> Option<T> {
        let CacheHandle::Enabled(client) = self else {
            return None;
        };

        match client.service().get(cache_name, key).await {
            CacheGet::Hit(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(cache = cache_name, key, "Discarding undecodable cache value: {e}");
                    None
                }
            },
            CacheGet::Miss => None,
            CacheGet::Error(message) => {
                error!(cache = cache_name, key, "Error getting from cache: {message}");
                None
            }
        }
    }

    /// Store `value` as JSON under `key` with the handle's default TTL.
    ///
    /// Best effort: the outcome is only logged.
    pub async fn set<T: Serialize + ?Sized>(&self, cache_name: &str, key: &str, value: &T) {
        let CacheHandle::Enabled(client) = self else {
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!(cache = cache_name, key, "Could not serialize value for cache: {e}");
                return;
            }
        };

        match client
            .service()
            .set(cache_name, key, raw, client.default_ttl())
            .await
        {
            CacheSet::Success => info!(cache = cache_name, key, "Successfully cached data"),
            CacheSet::Error(message) => {
                error!(cache = cache_name, key, "Error setting cache value: {message}")
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::memory::MemoryCache;
    use crate::cache::service::CacheService;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Cache service that fails every call and counts them.
    #[derive(Default)]
    pub(crate) struct BrokenCache {
        pub gets: AtomicUsize,
        pub sets: AtomicUsize,
    }

    #[async_trait]
    impl CacheService for BrokenCache {
        async fn get(&self, _cache_name: &str, _key: &str) -> CacheGet {
            self.gets.fetch_add(1, Ordering::SeqCst);
            CacheGet::Error("connection reset".into())
        }

        async fn set(&self, _cache_name: &str, _key: &str, _value: String, _ttl: Duration) -> CacheSet {
            self.sets.fetch_add(1, Ordering::SeqCst);
            CacheSet::Error("connection reset".into())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        location: String,
        lat: f64,
        lon: f64,
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            location: "Seattle".into(),
            lat: 47.6,
            lon: -122.3,
        }
    }

    const TTL: Duration = Duration::from_secs(900);

    #[tokio::test]
    async fn test_round_trip() {
        let handle = CacheHandle::enabled(Arc::new(MemoryCache::new()), TTL);

        handle.set("small-talk", "seattle", &snapshot()).await;
        let cached: Option<Snapshot> = handle.get("small-talk", "seattle").await;

        assert_eq!(cached, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_disabled_handle_is_inert() {
        let handle = CacheHandle::Disabled;

        handle.set("small-talk", "seattle", &snapshot()).await;
        let cached: Option<Snapshot> = handle.get("small-talk", "seattle").await;

        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_service_errors_are_swallowed() {
        let broken = Arc::new(BrokenCache::default());
        let handle = CacheHandle::enabled(broken.clone(), TTL);

        handle.set("small-talk", "seattle", &snapshot()).await;
        let cached: Option<Snapshot> = handle.get("small-talk", "seattle").await;

        assert!(cached.is_none());
        assert_eq!(broken.gets.load(Ordering::SeqCst), 1);
        assert_eq!(broken.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_value_reads_as_absent() {
        let memory = Arc::new(MemoryCache::new());
        memory
            .set("small-talk", "seattle", "not json".into(), TTL)
            .await;
        let handle = CacheHandle::enabled(memory, TTL);

        let cached: Option<Snapshot> = handle.get("small-talk", "seattle").await;
        assert!(cached.is_none());

        handle.set("small-talk", "other", &vec![1, 2, 3]).await;
        let wrong_shape: Option<Snapshot> = handle.get("small-talk", "other").await;
        assert!(wrong_shape.is_none());
    }

    #[tokio::test]
    async fn test_set_uses_handle_ttl() {
        let memory = Arc::new(MemoryCache::new());
        let handle = CacheHandle::enabled(memory.clone(), Duration::from_secs(1));

        handle.set("small-talk", "top-stories", &Vec::<u32>::new()).await;
        assert_eq!(
            handle.get::<Vec<u32>>("small-talk", "top-stories").await,
            Some(vec![])
        );

        memory.backdate("small-talk", "top-stories", chrono::Duration::seconds(1));

        let cached: Option<Vec<u32>> = handle.get("small-talk", "top-stories").await;
        assert!(cached.is_none());
    }
}

// Cache-aside flow.
// Look up, fetch on miss, store best-effort, return the value.

use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::error::Result;

use super::client::CacheHandle;

/// Serve `key` from the cache, or run `fetch` and cache its result.
///
/// Fetch errors are returned as-is and nothing is stored.
pub async fn with_cache<T, F, Fut>(
    cache: &CacheHandle,
    cache_name: &str,
    key: &str,
    fetch: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(cached) = cache.get::<T>(cache_name, key).await {
        info!(cache = cache_name, key, "Cache hit");
        return Ok(cached);
    }

    info!(cache = cache_name, key, "Cache miss, fetching fresh data");
    let fresh = fetch().await?;

    cache.set(cache_name, key, &fresh).await;
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::accessor::tests::BrokenCache;
    use crate::cache::memory::MemoryCache;
    use crate::error::SmallTalkError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_miss_fetches_then_hit_skips_fetch() {
        let handle = CacheHandle::enabled(Arc::new(MemoryCache::new()), TTL);
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = with_cache(&handle, "small-talk", "top-stories", || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["story".to_string()])
            })
            .await
            .unwrap();
            assert_eq!(value, vec!["story".to_string()]);
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_returned_and_not_stored() {
        let memory = Arc::new(MemoryCache::new());
        let handle = CacheHandle::enabled(memory.clone(), TTL);

        let result: Result<Vec<String>> = with_cache(&handle, "small-talk", "top-stories", || async {
            Err(SmallTalkError::Upstream {
                service: "Hacker News",
                status: 502,
            })
        })
        .await;

        assert!(result.unwrap_err().is_upstream());
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_broken_cache_still_returns_fresh_value() {
        let broken = Arc::new(BrokenCache::default());
        let handle = CacheHandle::enabled(broken.clone(), TTL);

        let value: u32 = with_cache(&handle, "small-talk", "k", || async { Ok(7) })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(broken.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let fetches = AtomicUsize::new(0);

        for _ in 0..2 {
            with_cache(&CacheHandle::Disabled, "small-talk", "k", || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(1u8)
            })
            .await
            .unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}

// In-process cache service.
// Keeps serialized values with their store time and expires them by TTL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::service::{CacheGet, CacheService, CacheSet};

/// A stored value with expiry metadata.
#[derive(Debug, Clone)]
pub struct CachedValue {
    pub value: String,
    /// When the value was stored.
    pub cached_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CachedValue {
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            ttl,
        }
    }

    /// Check if this value has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed >= self.ttl
    }
}

/// Cache service backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(String, String), CachedValue>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, cache_name: &str, key: &str, by: chrono::Duration) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(&(cache_name.to_string(), key.to_string())) {
            entry.cached_at -= by;
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, cache_name: &str, key: &str) -> CacheGet {
        let Ok(mut entries) = self.entries.lock() else {
            return CacheGet::Error("memory cache lock poisoned".into());
        };

        let id = (cache_name.to_string(), key.to_string());
        match entries.get(&id) {
            Some(entry) if !entry.is_expired() => CacheGet::Hit(entry.value.clone()),
            Some(_) => {
                entries.remove(&id);
                CacheGet::Miss
            }
            None => CacheGet::Miss,
        }
    }

    async fn set(&self, cache_name: &str, key: &str, value: String, ttl: Duration) -> CacheSet {
        let Ok(mut entries) = self.entries.lock() else {
            return CacheSet::Error("memory cache lock poisoned".into());
        };

        // Drop expired entries so unread keys do not accumulate.
        entries.retain(|_, entry| !entry.is_expired());
        entries.insert(
            (cache_name.to_string(), key.to_string()),
            CachedValue::new(value, ttl),
        );
        CacheSet::Success
    }
}

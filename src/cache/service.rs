// Cache service interface.
// Raw string get/set against a remote key-value cache, with explicit response variants.

use std::time::Duration;

use async_trait::async_trait;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheGet {
    Hit(String),
    Miss,
    Error(String),
}

/// Outcome of a cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSet {
    Success,
    Error(String),
}

/// A key-value cache addressed by cache name and key.
///
/// Implementations report every failure through the `Error` variants
/// instead of returning `Result`.
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, cache_name: &str, key: &str) -> CacheGet;

    async fn set(&self, cache_name: &str, key: &str, value: String, ttl: Duration) -> CacheSet;
}

// Cache module for the cache-aside layer.
// Remote (Momento) and in-process cache services behind one best-effort handle.

pub mod accessor;
pub mod aside;
pub mod client;
pub mod memory;
pub mod momento;
pub mod service;

pub use aside::with_cache;
pub use client::{
    CacheClient, CacheClientFactory, CacheConnector, CacheHandle, MemoryConnector,
    MomentoConnector,
};
pub use memory::MemoryCache;
pub use service::{CacheGet, CacheService, CacheSet};

//! Cache layer
//!
//! Process-local TTL cache used for reference data (themes).
//!
//! Entries live only in this process. Running several instances behind a
//! load balancer would need a shared store instead; nothing here attempts
//! to coordinate between processes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wishlister::cache::{create_cache, CacheLayer};
//! use wishlister::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("themes:all", &themes, cache.default_ttl()).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The methods are generic over the cached type, so the trait is not object
/// safe. Services hold the concrete `MemoryCache` behind an `Arc`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;
}

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

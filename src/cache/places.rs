//! Opt-in cache for places queries.
//!
//! Re-classifying items at the same spot issues the same nearby search
//! again. [`CachingPlacesSearch`] answers those from memory. Positions
//! are bucketed to 4 decimal places (about 11 m) so jitter in the reported
//! location still hits the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::Result;
use crate::providers::PlacesSearch;
use crate::telemetry;
use crate::types::{BinQuery, NearbyBin};

const COORDINATE_SCALE: f64 = 10_000.0;

/// Configuration for the places cache.
///
/// ```rust
/// # use wastemap::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached queries. Default: 1,000.
    pub max_entries: u64,
    /// Time-to-live for cached entries. Default: 10 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    category: String,
    radius_m: u32,
    lat: i64,
    lng: i64,
}

impl From<&BinQuery> for QueryKey {
    fn from(query: &BinQuery) -> Self {
        Self {
            category: query.category.clone(),
            radius_m: query.radius_m,
            lat: (query.location.latitude * COORDINATE_SCALE).round() as i64,
            lng: (query.location.longitude * COORDINATE_SCALE).round() as i64,
        }
    }
}

/// In-memory LRU + TTL store of places results.
pub struct PlacesCache {
    cache: Cache<QueryKey, Vec<NearbyBin>>,
}

impl PlacesCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up cached bins. Emits cache hit/miss metrics.
    pub async fn get(&self, query: &BinQuery) -> Option<Vec<NearbyBin>> {
        match self.cache.get(&QueryKey::from(query)).await {
            Some(bins) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(bins)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    pub async fn insert(&self, query: &BinQuery, bins: Vec<NearbyBin>) {
        self.cache.insert(QueryKey::from(query), bins).await;
    }

    /// Approximate entry count (moka applies writes lazily).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Decorator answering repeated queries from a [`PlacesCache`].
///
/// Only successful searches are stored; errors always reach the caller.
pub struct CachingPlacesSearch {
    inner: Arc<dyn PlacesSearch>,
    cache: PlacesCache,
}

impl CachingPlacesSearch {
    pub fn new(inner: Arc<dyn PlacesSearch>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: PlacesCache::new(config),
        }
    }

    pub fn cache(&self) -> &PlacesCache {
        &self.cache
    }
}

#[async_trait]
impl PlacesSearch for CachingPlacesSearch {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>> {
        if let Some(bins) = self.cache.get(query).await {
            return Ok(bins);
        }
        let bins = self.inner.search(query).await?;
        self.cache.insert(query, bins.clone()).await;
        Ok(bins)
    }
}

//! Directory listing cache
//!
//! Uses moka for concurrent caching with TTL and size-based eviction. Entries
//! are keyed by canonical query so logically equal paths share one listing,
//! and are tagged with the store generation they were computed at.

use super::{Listing, VfsError};
use crate::query::Query;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

const UNSEEN: u64 = u64::MAX;

/// Configuration for the directory cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for cached listings in seconds (default: 30)
    pub ttl_secs: u64,
    /// Maximum number of cached listings (default: 1024)
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30, max_entries: 1024 }
    }
}

/// Identity of a cached listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingKey {
    /// Root and incomplete query states
    AllTags,
    /// Complete query state, always canonical
    Query(Query),
    /// Values used with a tag
    Values(String),
}

impl ListingKey {
    #[must_use]
    pub fn query(query: &Query) -> Self {
        Self::Query(query.canonical())
    }
}

/// What to drop from the cache
#[derive(Debug, Clone)]
pub enum InvalidationScope {
    All,
    Query(Query),
}

/// Listing cache with generation-based invalidation
pub struct DirectoryCache {
    listings: Cache<ListingKey, (Arc<Listing>, u64)>,
    /// Store generation observed on the last call
    generation: AtomicU64,
}

impl DirectoryCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            listings: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build(),
            generation: AtomicU64::new(UNSEEN),
        }
    }

    /// Cached listing for `key`, computing and storing it on a miss
    ///
    /// A `generation` different from the last one seen drops every entry first.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` fails with; failures are not cached.
    pub fn listing<F>(&self, key: &ListingKey, generation: u64, compute: F) -> Result<Arc<Listing>, VfsError>
    where
        F: FnOnce() -> Result<Listing, VfsError>,
    {
        self.observe(generation);

        if let Some((listing, built_at)) = self.listings.get(key)
            && built_at == generation
        {
            return Ok(listing);
        }

        debug!(?key, generation, "directory cache miss");
        let listing = Arc::new(compute()?);
        self.listings.insert(key.clone(), (Arc::clone(&listing), generation));
        Ok(listing)
    }

    pub fn invalidate(&self, scope: &InvalidationScope) {
        match scope {
            InvalidationScope::All => self.listings.invalidate_all(),
            InvalidationScope::Query(query) => self.listings.invalidate(&ListingKey::query(query)),
        }
    }

    fn observe(&self, generation: u64) {
        let previous = self.generation.swap(generation, Ordering::AcqRel);
        if previous != UNSEEN && previous != generation {
            debug!(previous, generation, "tag store changed, invalidating directory cache");
            self.listings.invalidate_all();
        }
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

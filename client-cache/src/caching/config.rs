use std::num::NonZeroUsize;
use std::time::Duration;

use super::ENTRY_MIN_SIZE;

/// Configuration for client side caching.
#[derive(Clone, Debug, Copy)]
pub struct CacheConfig {
    pub(crate) size: NonZeroUsize,
    pub(crate) entry_min_size: NonZeroUsize,
    pub(crate) default_client_ttl: Duration,
}

impl CacheConfig {
    /// Creates new CacheConfig with default values (128 MiB of capacity, [`ENTRY_MIN_SIZE`] floor and 30 minutes of client ttl)
    pub fn new() -> Self {
        Self {
            size: NonZeroUsize::new(128 * 1024 * 1024).unwrap(),
            entry_min_size: NonZeroUsize::new(ENTRY_MIN_SIZE).unwrap(),
            default_client_ttl: Duration::from_secs(60 * 30),
        }
    }

    /// Sets the total byte capacity of the cache, split evenly across its shards.
    pub fn set_size(mut self, size: NonZeroUsize) -> Self {
        self.size = size;
        self
    }

    /// Sets the minimum number of bytes every entry is charged, whatever the
    /// size of its key and value.
    ///
    /// `size / entry_min_size` is the number of entries the cache holds in the
    /// worst case of tiny keys and tiny replies, so sizing a cache for a target
    /// entry count is a multiplication:
    ///
    /// ```rust
    /// # use std::num::NonZeroUsize;
    /// # use client_cache::caching::{CacheConfig, ENTRY_MIN_SIZE};
    /// let config = CacheConfig::new()
    ///     .set_size(NonZeroUsize::new(ENTRY_MIN_SIZE * 10_000).unwrap());
    /// assert_eq!(config.size().get() / config.entry_min_size().get(), 10_000);
    /// ```
    pub fn set_entry_min_size(mut self, entry_min_size: NonZeroUsize) -> Self {
        self.entry_min_size = entry_min_size;
        self
    }

    /// Sets the default client side time to live (TTL) for cached values, used when the
    /// caller does not pass one explicitly.
    /// Client side TTL is the maximum time for a key to stay in cache, counted from
    /// the moment its slot is reserved. A shorter server side TTL, reported with
    /// [`CacheManager::update_with_server_ttl`](super::CacheManager::update_with_server_ttl),
    /// takes precedence.
    pub fn set_default_client_ttl(mut self, ttl: Duration) -> Self {
        self.default_client_ttl = ttl;
        self
    }

    /// Total byte capacity.
    pub fn size(&self) -> NonZeroUsize {
        self.size
    }

    /// Per-entry minimum charge in bytes.
    pub fn entry_min_size(&self) -> NonZeroUsize {
        self.entry_min_size
    }

    /// TTL used when the caller does not provide one.
    pub fn default_client_ttl(&self) -> Duration {
        self.default_client_ttl
    }
}

impl Default for CacheConfig {
    /// Creates new CacheConfig with default values (128 MiB of capacity, [`ENTRY_MIN_SIZE`] floor and 30 minutes of client ttl)
    fn default() -> Self {
        CacheConfig::new()
    }
}

use super::pending::{Lookup, PendingValue};
use super::shard::Shard;
use super::statistics::Statistics;
use super::CacheStatistics;
use crate::Value;
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Byte-bounded LRU cache split into independently locked shards.
///
/// Each key is routed to exactly one shard by a fixed hash of its bytes, and
/// every operation takes at most one shard lock, only for in-memory
/// bookkeeping. LRU order is strict within a shard; across shards keys are
/// evicted independently.
pub struct ShardedLRU {
    shards: Vec<Mutex<Shard>>,
    pub(crate) statistics: Arc<Statistics>,
}

impl ShardedLRU {
    const MAX_SHARD_COUNT: usize = 32;
    const MIN_ENTRIES_PER_SHARD: usize = 16;

    /// Creates a cache holding at most `total_size` bytes, charging every entry
    /// at least `entry_min_size` bytes.
    pub fn new(total_size: NonZeroUsize, entry_min_size: NonZeroUsize) -> Self {
        let shard_count = Self::shard_count(total_size.get(), entry_min_size.get());
        let shard_size = total_size.get() / shard_count;

        let statistics = Arc::new(Statistics::default());
        let shards = (0..shard_count)
            .map(|_| {
                Mutex::new(Shard::new(
                    shard_size,
                    entry_min_size.get(),
                    statistics.clone(),
                ))
            })
            .collect();
        ShardedLRU { shards, statistics }
    }

    /// Largest power of two up to `MAX_SHARD_COUNT` that still leaves room for
    /// `MIN_ENTRIES_PER_SHARD` minimal entries in every shard. Small caches
    /// end up with a single shard and therefore strict LRU order.
    fn shard_count(total_size: usize, entry_min_size: usize) -> usize {
        let mut shard_count = Self::MAX_SHARD_COUNT;
        while shard_count > 1
            && total_size / shard_count
                < entry_min_size.saturating_mul(Self::MIN_ENTRIES_PER_SHARD)
        {
            shard_count /= 2;
        }
        shard_count
    }

    /// get_shard will get MutexGuard for a shard determined by key, if lock is poisoned it'll be recovered.
    pub(crate) fn get_shard(&self, key: &[u8]) -> MutexGuard<'_, Shard> {
        let lock = &self.shards[self.shard_index(key)];
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn shard_index(&self, key: &[u8]) -> usize {
        let mut s = DefaultHasher::new();
        s.write(key);
        s.finish() as usize % self.shards.len()
    }

    fn shards(&self) -> impl Iterator<Item = MutexGuard<'_, Shard>> {
        self.shards
            .iter()
            .map(|lock| lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Returns the cached reply for `key`, or `None` after making sure a
    /// pending slot exists for it.
    ///
    /// On `None` the caller is expected to fetch the reply from the server and
    /// hand it to [`update`](Self::update). The slot expires `ttl` after it was
    /// first reserved, whenever the reply arrives.
    pub fn get_or_prepare(&self, key: &[u8], ttl: Duration) -> Option<Value> {
        let now = Instant::now();
        let mut shard = self.get_shard(key);
        if let Some(value) = shard.lookup(key, now).and_then(|entry| entry.value()) {
            self.statistics.increase_hit(1);
            return Some(value.clone());
        }
        shard.reserve(key, ttl, now);
        self.statistics.increase_miss(1);
        None
    }

    /// Like [`get_or_prepare`](Self::get_or_prepare), but tells a caller that
    /// finds the key already pending apart from the one that reserved it, and
    /// lets it wait for that caller's reply instead of fetching it again.
    pub fn get_or_subscribe(&self, key: &[u8], ttl: Duration) -> Lookup {
        let now = Instant::now();
        let mut shard = self.get_shard(key);
        if let Some(entry) = shard.lookup(key, now) {
            if let Some(value) = entry.value() {
                self.statistics.increase_hit(1);
                return Lookup::Hit(value.clone());
            }
            if let Some(receiver) = entry.subscribe() {
                self.statistics.increase_miss(1);
                return Lookup::Pending(PendingValue::new(receiver));
            }
        }
        shard.reserve(key, ttl, now);
        self.statistics.increase_miss(1);
        Lookup::Miss
    }

    /// Fills the pending slot of `key`. Ignored if the slot is gone.
    pub fn update(&self, key: &[u8], value: Value) {
        self.update_with_expire_time(key, value, None)
    }

    pub(crate) fn update_with_expire_time(
        &self,
        key: &[u8],
        value: Value,
        server_expire_time: Option<Instant>,
    ) {
        let now = Instant::now();
        let waiters = self.get_shard(key).fill(key, value, server_expire_time, now);
        if let Some(waiters) = waiters {
            waiters.notify();
        }
    }

    /// Drops each of `keys` from the cache. Keys that are not cached are ignored.
    pub fn delete<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        for key in keys {
            let key = key.as_ref();
            if self.get_shard(key).remove(key) {
                self.statistics.increase_invalidate(1);
            }
        }
    }

    /// Drops every entry, shard by shard.
    pub fn delete_all(&self) {
        let mut cleared = 0;
        for mut shard in self.shards() {
            cleared += shard.clear();
        }
        self.statistics.increase_invalidate(cleared);
        debug!("Flushed {cleared} cached entries");
    }

    /// Number of entries, pending or filled, currently held.
    pub fn len(&self) -> usize {
        self.shards().map(|shard| shard.len()).sum()
    }

    /// Returns `true` if no entry is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged across all shards.
    pub fn used_size(&self) -> usize {
        self.shards().map(|shard| shard.used_size()).sum()
    }

    /// Total byte budget across all shards.
    pub fn capacity(&self) -> usize {
        self.shards().map(|shard| shard.budget()).sum()
    }

    #[cfg(test)]
    pub(crate) fn shard_len(&self) -> usize {
        self.shards.len()
    }

    /// Snapshot of the hit, miss, invalidation and eviction counters.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics::from(self.statistics.as_ref())
    }
}

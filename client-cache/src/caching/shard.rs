use super::entry::{Entry, Waiters};
use super::statistics::Statistics;
use crate::Value;
use log::trace;
use lru::LruCache;
use std::sync::Arc;
use std::time::{Duration, Instant};

type CacheKey = Vec<u8>;

/// Size-bounded LRU partition of the cache.
///
/// Recency is kept by the `LruCache` itself, the byte accounting is done here:
/// the inner cache is unbounded and `evict_overflow` pops from its LRU end until
/// `used_size` is back within `budget`.
pub(crate) struct Shard {
    entries: LruCache<CacheKey, Entry>,
    used_size: usize,
    budget: usize,
    entry_min_size: usize,
    statistics: Arc<Statistics>,
}

impl Shard {
    pub(crate) fn new(budget: usize, entry_min_size: usize, statistics: Arc<Statistics>) -> Self {
        Shard {
            entries: LruCache::unbounded(),
            used_size: 0,
            budget,
            entry_min_size,
            statistics,
        }
    }

    /// Finds the entry for `key` and marks it most recently used.
    /// An expired entry is dropped and reported as absent.
    pub(crate) fn lookup(&mut self, key: &[u8], now: Instant) -> Option<&mut Entry> {
        let expired = self.entries.get_mut(key)?.is_expired(now);
        if expired {
            self.statistics.increase_expire(1);
            self.remove(key);
            return None;
        }
        self.entries.peek_mut(key)
    }

    /// Reserves a pending slot for `key`, returning `true` if the key was
    /// already present (pending or filled, and unexpired).
    ///
    /// The new slot may be evicted right away if it alone does not fit the budget.
    pub(crate) fn reserve(&mut self, key: &[u8], ttl: Duration, now: Instant) -> bool {
        if self.lookup(key, now).is_some() {
            return true;
        }
        let entry = Entry::pending(key, self.entry_min_size, now, ttl);
        self.used_size += entry.size();
        let _ = self.entries.push(key.to_vec(), entry);
        self.evict_overflow();
        false
    }

    /// Fills a pending entry. A key that is absent, expired or already filled
    /// is left alone, so a late reply never brings back a dropped key.
    ///
    /// Returns the subscribers waiting for this reply; the caller notifies them
    /// once the shard lock is released.
    pub(crate) fn fill(
        &mut self,
        key: &[u8],
        value: Value,
        server_expire_time: Option<Instant>,
        now: Instant,
    ) -> Option<Waiters> {
        let entry_min_size = self.entry_min_size;
        let entry = self.lookup(key, now)?;
        let old_size = entry.size();
        let waiters = entry.fill(key, value, entry_min_size, server_expire_time)?;
        let new_size = entry.size();
        self.used_size = self.used_size - old_size + new_size;
        self.evict_overflow();
        Some(waiters)
    }

    pub(crate) fn remove(&mut self, key: &[u8]) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.used_size -= entry.size();
                true
            }
            None => false,
        }
    }

    /// Drops every entry and returns how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.used_size = 0;
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn used_size(&self) -> usize {
        self.used_size
    }

    pub(crate) fn budget(&self) -> usize {
        self.budget
    }

    fn evict_overflow(&mut self) {
        while self.used_size > self.budget {
            let Some((key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.used_size -= entry.size();
            self.statistics.increase_evict(1);
            trace!(
                "Evicted {} bytes for key {:?}, pending: {}",
                entry.size(),
                String::from_utf8_lossy(&key),
                entry.is_pending()
            );
        }
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters shared by every shard of a cache.
#[derive(Default, Debug)]
pub(crate) struct Statistics {
    hit: AtomicUsize,
    miss: AtomicUsize,
    invalidate: AtomicUsize,
    evict: AtomicUsize,
    expire: AtomicUsize,
}

impl Statistics {
    pub(crate) fn increase_hit(&self, val: usize) {
        self.hit.fetch_add(val, Ordering::Relaxed);
    }

    pub(crate) fn increase_miss(&self, val: usize) {
        self.miss.fetch_add(val, Ordering::Relaxed);
    }

    pub(crate) fn increase_invalidate(&self, val: usize) {
        self.invalidate.fetch_add(val, Ordering::Relaxed);
    }

    pub(crate) fn increase_evict(&self, val: usize) {
        self.evict.fetch_add(val, Ordering::Relaxed);
    }

    pub(crate) fn increase_expire(&self, val: usize) {
        self.expire.fetch_add(val, Ordering::Relaxed);
    }
}

/// A point-in-time copy of a cache's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Lookups answered from the cache.
    pub hit: usize,
    /// Lookups the caller had to send to the server.
    pub miss: usize,
    /// Entries dropped by `delete`, `delete_all` or an invalidation push.
    pub invalidate: usize,
    /// Entries dropped to keep a shard within its byte budget.
    pub evict: usize,
    /// Entries found past their deadline on access.
    pub expire: usize,
}

impl From<&Statistics> for CacheStatistics {
    fn from(statistics: &Statistics) -> Self {
        CacheStatistics {
            hit: statistics.hit.load(Ordering::Relaxed),
            miss: statistics.miss.load(Ordering::Relaxed),
            invalidate: statistics.invalidate.load(Ordering::Relaxed),
            evict: statistics.evict.load(Ordering::Relaxed),
            expire: statistics.expire.load(Ordering::Relaxed),
        }
    }
}

//! Server-assisted client side caching.
//! https://redis.io/docs/manual/client-side-caching/
//!
//! A [`ShardedLRU`] holds replies keyed by the key they were read for. Readers
//! consult it with `get_or_prepare`, which either answers from memory or
//! reserves a pending slot for the reply the caller is about to fetch; the
//! caller then fills the slot with `update`. Invalidation pushes from the
//! server go to `delete` and `delete_all`, usually through
//! [`CacheManager::handle_push_value`].

mod statistics;

mod cache_manager;
mod config;
mod entry;
mod pending;
mod shard;
mod sharded_lru;

pub use cache_manager::{CacheManager, Invalidation};
pub use config::CacheConfig;
pub use entry::{ENTRY_MIN_SIZE, ENTRY_OVERHEAD};
pub use pending::{Lookup, PendingValue};
pub use sharded_lru::ShardedLRU;
pub use statistics::CacheStatistics;

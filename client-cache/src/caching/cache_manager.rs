use super::entry::MAX_TTL;
use super::pending::Lookup;
use super::sharded_lru::ShardedLRU;
use super::{CacheConfig, CacheStatistics};
use crate::{InvalidationError, PushKind, Value};
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What an invalidation push asks the cache to drop.
#[derive(Clone, Debug, PartialEq)]
pub enum Invalidation {
    /// The listed keys changed on the server.
    Keys(Vec<Vec<u8>>),
    /// Every key may have changed (`FLUSHALL`, `FLUSHDB` or lost tracking).
    All,
}

/// Per-connection handle on a client side cache.
///
/// The connection layer owns one `CacheManager` per connection, consults it
/// before sending a read, populates it with the reply, and forwards every push
/// it receives to [`handle_push_value`](Self::handle_push_value). Clones share
/// the same underlying cache.
#[derive(Clone)]
pub struct CacheManager {
    lru: Arc<ShardedLRU>,
    pub(crate) cache_config: CacheConfig,
}

impl CacheManager {
    /// Creates a cache sized and tuned by `cache_config`.
    pub fn new(cache_config: CacheConfig) -> Self {
        let lru = Arc::new(ShardedLRU::new(
            cache_config.size,
            cache_config.entry_min_size,
        ));
        CacheManager { lru, cache_config }
    }

    /// The configuration this cache was built with.
    pub fn cache_config(&self) -> &CacheConfig {
        &self.cache_config
    }

    /// See [`ShardedLRU::get_or_prepare`].
    pub fn get_or_prepare(&self, redis_key: &[u8], client_side_ttl: Duration) -> Option<Value> {
        self.lru.get_or_prepare(redis_key, client_side_ttl)
    }

    /// [`get_or_prepare`](Self::get_or_prepare) with the configured default client side TTL.
    pub fn get_or_prepare_default(&self, redis_key: &[u8]) -> Option<Value> {
        self.get_or_prepare(redis_key, self.cache_config.default_client_ttl)
    }

    /// See [`ShardedLRU::get_or_subscribe`].
    pub fn get_or_subscribe(&self, redis_key: &[u8], client_side_ttl: Duration) -> Lookup {
        self.lru.get_or_subscribe(redis_key, client_side_ttl)
    }

    /// See [`ShardedLRU::update`].
    pub fn update(&self, redis_key: &[u8], value: Value) {
        self.lru.update(redis_key, value)
    }

    /// Fills the pending slot of `redis_key` with `value`, taking the server
    /// side TTL into account.
    ///
    /// `server_side_ttl_value` is the reply to a `PTTL` sent along the read. A
    /// positive TTL that ends before the client side deadline pulls the entry's
    /// deadline in; anything else (no expiry, missing key, odd reply) leaves
    /// the client side deadline alone.
    pub fn update_with_server_ttl(
        &self,
        redis_key: &[u8],
        value: Value,
        server_side_ttl_value: &Value,
    ) {
        let server_side_expire_time = match server_side_ttl_value {
            Value::Int(pttl) if *pttl > 0 => {
                let pttl = Duration::from_millis(*pttl as u64).min(MAX_TTL);
                Instant::now().checked_add(pttl)
            }
            _ => None,
        };
        self.lru
            .update_with_expire_time(redis_key, value, server_side_expire_time);
    }

    /// See [`ShardedLRU::delete`].
    pub fn delete<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.lru.delete(keys)
    }

    /// See [`ShardedLRU::delete_all`].
    pub fn delete_all(&self) {
        self.lru.delete_all()
    }

    /// Hit, miss, invalidation and eviction counters of this cache.
    pub fn statistics(&self) -> CacheStatistics {
        self.lru.statistics()
    }

    /// Applies a push received from the server to the cache.
    ///
    /// `invalidate` pushes drop the listed keys, or everything when the key
    /// list is nil. A disconnection drops everything as well, since
    /// invalidations sent while disconnected are lost. An `invalidate` push
    /// that cannot be decoded also flushes the cache: it is known that some
    /// key changed, but not which. Other pushes are ignored.
    pub fn handle_push_value(&self, kind: &PushKind, data: &[Value]) {
        match kind {
            PushKind::Invalidate => match Self::parse_invalidation(kind, data) {
                Ok(Invalidation::Keys(keys)) => self.delete(keys),
                Ok(Invalidation::All) => self.delete_all(),
                Err(err) => {
                    warn!("{err}, dropping every cached entry");
                    self.delete_all();
                }
            },
            PushKind::Disconnection => {
                debug!("Connection lost, dropping every cached entry");
                self.delete_all();
            }
            _ => {}
        }
    }

    /// Decodes the payload of an `invalidate` push.
    ///
    /// The payload is a single element: either an array of keys, or nil when
    /// the server invalidates everything at once.
    pub fn parse_invalidation(
        kind: &PushKind,
        data: &[Value],
    ) -> Result<Invalidation, InvalidationError> {
        if kind != &PushKind::Invalidate {
            return Err(InvalidationError::new(kind, "not an invalidation push"));
        }
        match data.first() {
            Some(Value::Nil) => Ok(Invalidation::All),
            Some(Value::Array(redis_keys)) | Some(Value::Set(redis_keys)) => redis_keys
                .iter()
                .map(|redis_key| {
                    redis_key
                        .as_key_bytes()
                        .map(<[u8]>::to_vec)
                        .ok_or_else(|| InvalidationError::unexpected_value(kind, redis_key))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Invalidation::Keys),
            Some(other) => Err(InvalidationError::unexpected_value(kind, other)),
            None => Err(InvalidationError::new(kind, "missing key list")),
        }
    }
}

//! client-cache is the response cache of a RESP3 client.  It sits between a
//! connection's read commands and the network: repeated reads are answered
//! from local memory, and the invalidation pushes the server sends for
//! tracked keys keep the local copies consistent.
//!
//! The crate is called `client-cache` and you can depend on it via cargo:
//!
//! ```ini
//! [dependencies.client-cache]
//! version = "*"
//! ```
//!
//! # Basic Operation
//!
//! The cache does not speak the protocol itself.  The connection layer asks it
//! before sending a read, and fills it once the reply is decoded:
//!
//! ```rust
//! use std::time::Duration;
//! use client_cache::caching::{CacheConfig, CacheManager};
//! use client_cache::Value;
//!
//! let cache = CacheManager::new(CacheConfig::new());
//! let ttl = Duration::from_secs(60);
//!
//! // Miss: a pending slot is reserved, go ask the server.
//! assert_eq!(cache.get_or_prepare(b"user:1", ttl), None);
//! let reply = Value::BulkString(b"alice".to_vec()); // reply to GET user:1
//! cache.update(b"user:1", reply.clone());
//!
//! // Hit: answered from memory until the TTL runs out or the key is invalidated.
//! assert_eq!(cache.get_or_prepare(b"user:1", ttl), Some(reply));
//! ```
//!
//! ## Invalidation
//!
//! With client tracking enabled the server pushes an `invalidate` message
//! whenever a key read through this connection changes.  Forward every push to
//! [`CacheManager::handle_push_value`](caching::CacheManager::handle_push_value):
//!
//! ```rust
//! # use std::time::Duration;
//! # use client_cache::caching::{CacheConfig, CacheManager};
//! # use client_cache::{PushKind, Value};
//! # let cache = CacheManager::new(CacheConfig::new());
//! # let ttl = Duration::from_secs(60);
//! # cache.get_or_prepare(b"user:1", ttl);
//! # cache.update(b"user:1", Value::Okay);
//! cache.handle_push_value(
//!     &PushKind::Invalidate,
//!     &[Value::Array(vec![Value::BulkString(b"user:1".to_vec())])],
//! );
//! assert_eq!(cache.get_or_prepare(b"user:1", ttl), None);
//! ```
//!
//! ## Memory and expiry
//!
//! Capacity is a byte budget split evenly across independently locked
//! shards.  Every entry is charged its key length, the RESP3 encoded length of
//! its reply and a fixed overhead, and never less than
//! [`ENTRY_MIN_SIZE`](caching::ENTRY_MIN_SIZE).  When a shard goes over budget
//! its least recently used entries are evicted.  Entries expire a TTL after
//! their slot was reserved; expiry is checked on access, there is no
//! background sweeper.
//!
//! ## Concurrent misses
//!
//! `get_or_prepare` never waits: two callers missing on the same key both go
//! to the server.  [`get_or_subscribe`](caching::CacheManager::get_or_subscribe)
//! lets the second caller wait for the first one's reply instead.

#![deny(non_camel_case_types)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, warn(rustdoc::broken_intra_doc_links))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use crate::errors::InvalidationError;
pub use crate::types::{PushKind, Value, VerbatimFormat};

pub mod caching;

mod errors;
mod types;

//! In-memory response cache.
//!
//! # Data Flow
//! ```text
//! cache miss, 2xx from origin
//!     → policy.rs (extension + length admission)
//!     → ResponseCache::store (single lock)
//!     → store.rs (evict oldest until it fits, insert with TTL)
//!
//! later request, same path
//!     → ResponseCache::lookup (single lock)
//!     → store.rs (lazy expiry, refresh last access)
//! ```
//!
//! # Design Decisions
//! - One mutex guards the whole store; eviction runs under the same lock as the
//!   size check that triggered it
//! - The lock is never held across an await
//! - Payloads are immutable `Bytes`; handing out a clone cannot alter the cache
//! - No request coalescing: concurrent misses may both reach the origin

pub mod clock;
pub mod policy;
pub mod store;

use std::sync::Arc;

use axum::http::HeaderValue;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;

use crate::observability::metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{extension_of, CachePolicy};
pub use store::BoundedCache;

/// A cached origin response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Bytes,
    pub content_type: HeaderValue,
}

/// Point-in-time cache usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: u64,
    pub max_size_bytes: u64,
}

/// The shared response cache, keyed by inbound request path.
#[derive(Debug)]
pub struct ResponseCache {
    store: Mutex<BoundedCache<String, CachedResponse>>,
    policy: CachePolicy,
}

impl ResponseCache {
    pub fn new(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(BoundedCache::new(policy.max_size, clock)),
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.enabled
    }

    /// Fetch a live entry for `key`.
    pub fn lookup(&self, key: &str) -> Option<CachedResponse> {
        if !self.policy.enabled {
            return None;
        }
        let hit = {
            let mut store = self.store.lock();
            let hit = store.get(key);
            metrics::record_cache_size(store.current_size(), store.len());
            hit
        };
        metrics::record_cache_event(if hit.is_some() { "hit" } else { "miss" });
        hit
    }

    /// Store `body` under `key` if the policy admits it.
    ///
    /// Returns whether the entry was stored.
    pub fn store(&self, key: &str, ext: &str, body: Bytes, content_type: HeaderValue) -> bool {
        let len = body.len() as u64;
        if !self.policy.enabled || !self.policy.is_cacheable(ext, len) {
            return false;
        }

        let stored = {
            let mut store = self.store.lock();
            let stored = store.set(
                key.to_string(),
                CachedResponse { body, content_type },
                len,
                self.policy.ttl,
            );
            metrics::record_cache_size(store.current_size(), store.len());
            stored
        };

        metrics::record_cache_event(if stored { "store" } else { "reject" });
        stored
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut store = self.store.lock();
        store.clear();
        metrics::record_cache_size(0, 0);
    }

    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock();
        CacheStats {
            entries: store.len(),
            size_bytes: store.current_size(),
            max_size_bytes: store.max_size(),
        }
    }
}

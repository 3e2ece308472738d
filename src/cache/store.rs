//! Size- and TTL-bounded key/value store.
//!
//! # Eviction
//! Entries are evicted oldest-inserted first. Reads never change the eviction
//! order; they only refresh an entry's last-access time. Insertion order lives in
//! an explicit `sequence → key` index, so "oldest" is always the smallest
//! sequence number rather than whatever order a hash map iterates in.
//!
//! # Expiry
//! Lazy: an expired entry is removed the next time `get`/`has` touches it.
//!
//! The store itself is not synchronized; see [`super::ResponseCache`] for the
//! shared wrapper.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::clock::Clock;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    size: u64,
    seq: u64,
    created_at: Instant,
    last_access: Instant,
    expires_at: Option<Instant>,
}

impl<V> Slot<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Metadata about a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub size: u64,
    pub created_at: Instant,
    pub last_access: Instant,
    pub expires_at: Option<Instant>,
}

/// Capacity-bounded store with insertion-order eviction and optional TTLs.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    next_seq: u64,
    max_size: u64,
    current_size: u64,
    clock: Arc<dyn Clock>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(max_size: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            max_size,
            current_size: 0,
            clock,
        }
    }

    /// Insert `value`, charging `size` bytes against the capacity.
    ///
    /// Returns `false` (and leaves the store untouched) when `size` alone
    /// exceeds the capacity. Otherwise evicts oldest entries until the new
    /// one fits. An existing entry under the same key is replaced.
    pub fn set(&mut self, key: K, value: V, size: u64, ttl: Option<Duration>) -> bool {
        if size > self.max_size {
            return false;
        }

        self.delete(&key);

        while self.current_size + size > self.max_size {
            if !self.evict_oldest() {
                break;
            }
        }

        let now = self.clock.now();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            Slot {
                value,
                size,
                seq,
                created_at: now,
                last_access: now,
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            },
        );
        self.current_size += size;
        true
    }

    /// Remove the entry if present.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.seq);
        self.current_size -= slot.size;
        Some(slot.value)
    }

    /// Whether a live entry exists. Removes it if it has expired.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_slot(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.current_size = 0;
    }

    pub fn info<Q>(&self, key: &Q) -> Option<EntryInfo>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|slot| EntryInfo {
            size: slot.size,
            created_at: slot.created_at,
            last_access: slot.last_access,
            expires_at: slot.expires_at,
        })
    }

    /// Keys from oldest to newest insertion.
    pub fn keys_by_age(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    fn live_slot<Q>(&mut self, key: &Q) -> Option<&mut Slot<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        if self.entries.get(key)?.is_expired(now) {
            self.delete(key);
            return None;
        }

        let slot = self.entries.get_mut(key)?;
        slot.last_access = now;
        Some(slot)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, key)) = self.order.pop_first() else {
            return false;
        };
        if let Some(slot) = self.entries.remove(&key) {
            self.current_size -= slot.size;
        }
        true
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Fetch a live entry, refreshing its last-access time.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_slot(key).map(|slot| slot.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn cache(max_size: u64) -> (BoundedCache<String, &'static str>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (BoundedCache::new(max_size, clock.clone()), clock)
    }

    fn assert_size_matches_entries<V>(cache: &BoundedCache<String, V>) {
        let sum: u64 = cache.entries.values().map(|s| s.size).sum();
        assert_eq!(cache.current_size(), sum);
        assert!(cache.current_size() <= cache.max_size());
        assert_eq!(cache.order.len(), cache.entries.len());
    }

    #[test]
    fn set_and_get() {
        let (mut cache, _) = cache(100);
        assert!(cache.set("a".into(), "alpha", 10, None));
        assert_eq!(cache.get("a"), Some("alpha"));
        assert!(cache.has("a"));
        assert_eq!(cache.current_size(), 10);
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn evicts_oldest_inserted_first() {
        let (mut cache, _) = cache(100);
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            assert!(cache.set(key.to_string(), "v", 30, None));
            assert_size_matches_entries(&cache);
            assert!(cache.current_size() <= 100, "after insert {i}");
        }

        // 4 x 30 > 100: "a" is the only casualty.
        assert!(!cache.has("a"));
        let keys: Vec<_> = cache.keys_by_age().cloned().collect();
        assert_eq!(keys, ["b", "c", "d"]);
        assert_eq!(cache.current_size(), 90);
    }

    #[test]
    fn reads_do_not_change_eviction_order() {
        let (mut cache, clock) = cache(60);
        cache.set("a".into(), "v", 30, None);
        cache.set("b".into(), "v", 30, None);

        clock.advance(Duration::from_secs(1));
        let before = cache.info("a").unwrap();
        assert_eq!(cache.get("a"), Some("v"));
        let after = cache.info("a").unwrap();
        assert!(after.last_access > before.last_access);
        assert_eq!(after.created_at, before.created_at);

        // "a" was read most recently but inserted first, so it goes.
        cache.set("c".into(), "v", 30, None);
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
    }

    #[test]
    fn large_insert_evicts_several() {
        let (mut cache, _) = cache(100);
        for key in ["a", "b", "c", "d", "e"] {
            cache.set(key.into(), "v", 20, None);
        }
        assert!(cache.set("big".into(), "v", 70, None));
        let keys: Vec<_> = cache.keys_by_age().cloned().collect();
        assert_eq!(keys, ["e", "big"]);
        assert_eq!(cache.current_size(), 90);
        assert_size_matches_entries(&cache);
    }

    #[test]
    fn oversized_entry_is_rejected_without_eviction() {
        let (mut cache, _) = cache(100);
        cache.set("a".into(), "v", 40, None);

        assert!(!cache.set("huge".into(), "v", 101, None));
        assert_eq!(cache.current_size(), 40);
        assert!(cache.has("a"));
        assert!(!cache.has("huge"));

        let (mut empty, _) = self::cache(100);
        assert!(!empty.set("huge".into(), "v", 101, None));
        assert!(empty.is_empty());
    }

    #[test]
    fn entry_exactly_at_capacity_fits() {
        let (mut cache, _) = cache(100);
        cache.set("a".into(), "v", 1, None);
        assert!(cache.set("full".into(), "v", 100, None));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 100);
    }

    #[test]
    fn replacing_a_key_keeps_one_entry() {
        let (mut cache, _) = cache(100);
        cache.set("a".into(), "old", 40, None);
        cache.set("b".into(), "v", 10, None);
        assert!(cache.set("a".into(), "new", 50, None));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 60);
        assert_eq!(cache.get("a"), Some("new"));
        // The replacement counts as the newest insertion.
        let keys: Vec<_> = cache.keys_by_age().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
        assert_size_matches_entries(&cache);
    }

    #[test]
    fn ttl_expiry_is_lazy() {
        let (mut cache, clock) = cache(100);
        cache.set("a".into(), "v", 25, Some(Duration::from_secs(1)));
        cache.set("forever".into(), "v", 5, None);
        assert_eq!(cache.current_size(), 30);

        clock.advance(Duration::from_secs(1));
        assert!(cache.has("a"), "expiry is strictly after the deadline");

        clock.advance(Duration::from_millis(1));
        // Nothing has touched the entry yet, so it still counts.
        assert_eq!(cache.current_size(), 30);
        assert_eq!(cache.get("a"), None);
        assert!(!cache.has("a"));
        assert_eq!(cache.current_size(), 5);

        clock.advance(Duration::from_secs(1_000_000));
        assert!(cache.has("forever"));
    }

    #[test]
    fn unrepresentable_ttl_never_expires() {
        let (mut cache, clock) = cache(100);
        assert!(cache.set("a".into(), "v", 10, Some(Duration::MAX)));
        clock.advance(Duration::from_secs(10 * 365 * 86_400));
        assert_eq!(cache.get("a"), Some("v"));
    }

    #[test]
    fn has_evicts_expired_entries() {
        let (mut cache, clock) = cache(100);
        cache.set("a".into(), "v", 10, Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));
        assert!(!cache.has("a"));
        assert_eq!(cache.current_size(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn delete_and_clear() {
        let (mut cache, _) = cache(100);
        cache.set("a".into(), "v", 10, None);
        cache.set("b".into(), "v", 20, None);

        assert_eq!(cache.delete("a"), Some("v"));
        assert_eq!(cache.delete("a"), None);
        assert_eq!(cache.current_size(), 20);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.current_size(), 0);
        assert_eq!(cache.keys_by_age().count(), 0);
    }

    #[test]
    fn capacity_invariant_holds_under_churn() {
        let (mut cache, clock) = cache(1_000);
        let mut accepted = Vec::new();
        for i in 0..500u64 {
            let size = (i * 37) % 400 + 1;
            let ttl = (i % 3 == 0).then(|| Duration::from_secs(i % 7));
            if cache.set(format!("k{i}"), "v", size, ttl) {
                accepted.push(format!("k{i}"));
            }
            if i % 10 == 0 {
                clock.advance(Duration::from_secs(1));
                cache.has(&format!("k{}", i / 2));
            }
            assert_size_matches_entries(&cache);
        }

        // The newest accepted insertion always survives its own set.
        let newest = accepted.last().unwrap();
        assert_eq!(cache.keys_by_age().last(), Some(newest));
    }
}

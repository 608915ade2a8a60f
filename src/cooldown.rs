// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared expiring marker cache.
//!
//! Cooldown gates store short-lived markers keyed by client id: the
//! minimum-distance gate marks "recently seen" clients, the landmine
//! gate marks locked-out ones. Expiry is logical (a stored deadline);
//! entries past their deadline count as absent regardless of whether a
//! purge has physically removed them yet.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Concurrent key → expiry-deadline map.
#[derive(Debug, Default)]
pub struct CooldownCache {
    markers: DashMap<String, Instant>,
}

impl CooldownCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-then-insert: if no live marker exists for `key`,
    /// insert one expiring after `ttl` and return `true`. If a live
    /// marker is already present, return `false` and leave it untouched.
    ///
    /// Two concurrent callers for the same key never both see "absent";
    /// the entry guard serializes them.
    pub fn try_acquire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        match self.markers.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    false
                } else {
                    occupied.insert(now + ttl);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + ttl);
                true
            }
        }
    }

    /// Whether a live marker exists for `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        self.markers
            .get(key)
            .map_or(false, |deadline| *deadline > Instant::now())
    }

    /// Unconditionally set a marker expiring after `ttl`.
    pub fn lock(&self, key: &str, ttl: Duration) {
        self.markers.insert(key.to_string(), Instant::now() + ttl);
    }

    /// Physically remove dead markers. Correctness never depends on this;
    /// it only bounds memory for keys that are never touched again.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.markers.retain(|_, deadline| *deadline > now);
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_acquire_admits_once_per_window() {
        let cache = CooldownCache::new();
        assert!(cache.try_acquire("client", Duration::from_secs(1)));
        assert!(!cache.try_acquire("client", Duration::from_secs(1)));
    }

    #[test]
    fn expired_marker_counts_as_absent() {
        let cache = CooldownCache::new();
        assert!(cache.try_acquire("client", Duration::from_millis(20)));
        thread::sleep(Duration::from_millis(40));
        assert!(!cache.is_locked("client"));
        assert!(cache.try_acquire("client", Duration::from_millis(20)));
    }

    #[test]
    fn lock_sets_a_live_marker() {
        let cache = CooldownCache::new();
        cache.lock("client", Duration::from_secs(60));
        assert!(cache.is_locked("client"));
        assert!(!cache.try_acquire("client", Duration::from_secs(1)));
    }

    #[test]
    fn purge_drops_only_dead_markers() {
        let cache = CooldownCache::new();
        cache.lock("dead", Duration::from_millis(10));
        cache.lock("live", Duration::from_secs(60));
        thread::sleep(Duration::from_millis(30));
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert!(cache.is_locked("live"));
    }

    #[test]
    fn concurrent_acquire_admits_exactly_one() {
        let cache = Arc::new(CooldownCache::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.try_acquire("contended", Duration::from_secs(5)))
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);
    }
}

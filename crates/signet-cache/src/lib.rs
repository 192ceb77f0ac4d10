//! # Signet RRset Cache
//!
//! A process-wide concurrent map from `(owner name, query type)` to parsed
//! resource records. The cache enforces no TTLs: freshness is bounded
//! entirely by external invalidation — the store's change-notification
//! channel on masters, the end of a sync cycle on slaves — plus the fact
//! that any entry may vanish at any time.
//!
//! `clear` may race with `set`; a writer racing a clear can leave a stale
//! entry behind, which is tolerated because the next change notification
//! clears again.

use dashmap::DashMap;
use signet_proto::{Name, RecordType, ResourceRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Concurrent RRset cache.
///
/// Values are `Arc`ed so readers never observe a torn record list.
#[derive(Default)]
pub struct RecordCache {
    entries: DashMap<String, Arc<Vec<ResourceRecord>>>,
    stats: CacheStats,
}

impl RecordCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the cache key for a name and query type.
    fn key(name: &Name, qtype: RecordType) -> String {
        format!("{}:{}", name, qtype.to_u16())
    }

    /// Looks up the RRset for `(name, qtype)`.
    ///
    /// `Some(empty)` is a memoized negative answer; `None` is a miss.
    pub fn get(&self, name: &Name, qtype: RecordType) -> Option<Arc<Vec<ResourceRecord>>> {
        let hit = self
            .entries
            .get(&Self::key(name, qtype))
            .map(|e| Arc::clone(e.value()));
        match hit {
            Some(records) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(records)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores the RRset for `(name, qtype)`, replacing any previous value.
    pub fn set(&self, name: &Name, qtype: RecordType, records: Vec<ResourceRecord>) {
        self.entries.insert(Self::key(name, qtype), Arc::new(records));
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of cached RRsets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the hit/miss counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Cache hit/miss counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    /// Returns the number of lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the number of lookups that fell through to the store.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn a_record(owner: &str, addr: [u8; 4]) -> ResourceRecord {
        ResourceRecord::a(name(owner), 300, Ipv4Addr::from(addr))
    }

    #[test]
    fn set_get_clear() {
        let cache = RecordCache::new();
        let owner = name("www.example.com.");

        assert!(cache.get(&owner, RecordType::A).is_none());

        cache.set(&owner, RecordType::A, vec![a_record("www.example.com.", [1, 2, 3, 4])]);
        let hit = cache.get(&owner, RecordType::A).unwrap();
        assert_eq!(hit.len(), 1);

        cache.clear();
        assert!(cache.get(&owner, RecordType::A).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_rrset_is_a_hit() {
        let cache = RecordCache::new();
        let owner = name("missing.example.com.");

        cache.set(&owner, RecordType::A, Vec::new());
        let hit = cache.get(&owner, RecordType::A).unwrap();
        assert!(hit.is_empty());
    }

    #[test]
    fn distinct_types_do_not_collide() {
        let cache = RecordCache::new();
        let owner = name("example.com.");

        cache.set(&owner, RecordType::A, vec![a_record("example.com.", [1, 1, 1, 1])]);
        assert!(cache.get(&owner, RecordType::AAAA).is_none());
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let cache = RecordCache::new();
        let owner = name("example.com.");

        cache.get(&owner, RecordType::A);
        cache.set(&owner, RecordType::A, Vec::new());
        cache.get(&owner, RecordType::A);
        cache.get(&owner, RecordType::A);

        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 2);
    }

    #[test]
    fn concurrent_readers_and_writers() {
        use std::sync::Arc as StdArc;
        use std::thread;

        let cache = StdArc::new(RecordCache::new());
        let owner = name("example.com.");

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            let owner = owner.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    cache.set(&owner, RecordType::A, vec![a_record("example.com.", [10, 0, 0, i])]);
                    if let Some(records) = cache.get(&owner, RecordType::A) {
                        assert_eq!(records.len(), 1);
                    }
                    cache.clear();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}

//! In-memory `ZoneStore` for handler and sync-loop tests.
//!
//! Mirrors the production store's observable behavior: textual rdata with
//! the `(name, type, data)` uniqueness key, longest-suffix zone
//! attribution, destructive per-zone deletes that take signatures with
//! them. Query traffic is counted so tests can observe cache hits.

use async_trait::async_trait;
use parking_lot::Mutex;
use signet_proto::{Name, RecordType, ResourceRecord};
use signet_store::{longest_zone_suffix, serialize_rdata, RRsetKey, Result, StoreError, ZoneStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct Row {
    zone_id: i32,
    name: String,
    rtype: RecordType,
    ttl: u32,
    data: String,
}

/// In-memory store with instrumentation.
#[derive(Default)]
pub struct MockStore {
    zones: Mutex<Vec<(i32, Name)>>,
    records: Mutex<Vec<Row>>,
    rrsigs: Mutex<Vec<(String, RecordType, String)>>,
    next_zone_id: AtomicUsize,
    /// Number of `query_records` calls, for cache-hit assertions.
    pub record_queries: AtomicUsize,
    /// When set, every query operation fails.
    pub fail_queries: AtomicBool,
}

impl MockStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            next_zone_id: AtomicUsize::new(1),
            ..Self::default()
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    /// Returns every stored `(name, type, data)` tuple, for multiset
    /// comparisons in replication tests.
    pub fn record_tuples(&self) -> Vec<(String, String, String)> {
        let mut tuples: Vec<_> = self
            .records
            .lock()
            .iter()
            .map(|row| (row.name.clone(), row.rtype.to_string(), row.data.clone()))
            .collect();
        tuples.sort();
        tuples
    }

    /// Returns every stored signature as `(name, covered, text)`.
    pub fn rrsig_tuples(&self) -> Vec<(String, String, String)> {
        let mut tuples: Vec<_> = self
            .rrsigs
            .lock()
            .iter()
            .map(|(name, covered, text)| (name.clone(), covered.to_string(), text.clone()))
            .collect();
        tuples.sort();
        tuples
    }
}

#[async_trait]
impl ZoneStore for MockStore {
    async fn insert_zone(&self, name: &Name) -> Result<i32> {
        let apex = name.lowercased();
        let mut zones = self.zones.lock();
        if let Some((id, _)) = zones.iter().find(|(_, zone)| zone == &apex) {
            return Ok(*id);
        }
        let id = self.next_zone_id.fetch_add(1, Ordering::SeqCst) as i32;
        zones.push((id, apex));
        Ok(id)
    }

    async fn zone_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .zones
            .lock()
            .iter()
            .map(|(_, zone)| zone.to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn rrset_keys_for_zone(&self, zone: &Name) -> Result<Vec<RRsetKey>> {
        self.check_available()?;
        let zone_id = {
            let zones = self.zones.lock();
            match zones.iter().find(|(_, z)| z == &zone.lowercased()) {
                Some((id, _)) => *id,
                None => return Ok(Vec::new()),
            }
        };

        let mut keys: Vec<RRsetKey> = Vec::new();
        for row in self.records.lock().iter().filter(|r| r.zone_id == zone_id) {
            let Ok(name) = row.name.parse::<Name>() else {
                continue;
            };
            let key = RRsetKey {
                name,
                rtype: row.rtype,
            };
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    async fn query_records(&self, name: &Name, rtype: RecordType) -> Result<Vec<ResourceRecord>> {
        self.record_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let owner = name.lowercased().to_string();
        let mut records = Vec::new();
        for row in self
            .records
            .lock()
            .iter()
            .filter(|r| r.name == owner && r.rtype == rtype)
        {
            let line = format!("{} {} IN {} {}", row.name, row.ttl, row.rtype, row.data);
            if let Ok(rr) = line.parse::<ResourceRecord>() {
                records.push(rr);
            }
        }
        Ok(records)
    }

    async fn query_rrsig(
        &self,
        name: &Name,
        covered: RecordType,
    ) -> Result<Option<ResourceRecord>> {
        self.check_available()?;
        let owner = name.lowercased().to_string();
        let text = self
            .rrsigs
            .lock()
            .iter()
            .find(|(n, c, _)| *n == owner && *c == covered)
            .map(|(_, _, text)| text.clone());
        match text {
            Some(text) => Ok(Some(text.parse::<ResourceRecord>()?)),
            None => Ok(None),
        }
    }

    async fn upsert_record(&self, rr: &ResourceRecord) -> Result<()> {
        self.check_available()?;
        let owner = rr.name().lowercased();
        let data = serialize_rdata(rr)?;

        let zone_id = {
            let zones = self.zones.lock();
            let Some((id, _)) = longest_zone_suffix(&owner, &zones) else {
                return Err(StoreError::ZoneNotFound {
                    owner: owner.to_string(),
                });
            };
            id
        };

        let owner = owner.to_string();
        let mut records = self.records.lock();
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.name == owner && r.rtype == rr.rtype() && r.data == data)
        {
            existing.ttl = rr.ttl();
        } else {
            records.push(Row {
                zone_id,
                name: owner,
                rtype: rr.rtype(),
                ttl: rr.ttl(),
                data,
            });
        }
        Ok(())
    }

    async fn store_rrsig(
        &self,
        name: &Name,
        covered: RecordType,
        rr: &ResourceRecord,
    ) -> Result<()> {
        self.check_available()?;
        let owner = name.lowercased().to_string();
        let text = rr.with_lowercase_name().to_string();

        let mut rrsigs = self.rrsigs.lock();
        if let Some(existing) = rrsigs
            .iter_mut()
            .find(|(n, c, _)| *n == owner && *c == covered)
        {
            existing.2 = text;
        } else {
            rrsigs.push((owner, covered, text));
        }
        Ok(())
    }

    async fn delete_zone_records(&self, zone_id: i32) -> Result<()> {
        let mut records = self.records.lock();
        let owners: Vec<String> = records
            .iter()
            .filter(|r| r.zone_id == zone_id)
            .map(|r| r.name.clone())
            .collect();

        self.rrsigs
            .lock()
            .retain(|(name, _, _)| !owners.contains(name));
        records.retain(|r| r.zone_id != zone_id);
        Ok(())
    }

    async fn truncate_all(&self) -> Result<()> {
        self.zones.lock().clear();
        self.records.lock().clear();
        self.rrsigs.lock().clear();
        self.next_zone_id.store(1, Ordering::SeqCst);
        Ok(())
    }
}

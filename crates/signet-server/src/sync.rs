//! Slave synchronization loop.
//!
//! A slave starts from a clean slate: truncate the local store, flush the
//! cache, stamp `last_sync`. Every cycle then fetches the master's export
//! and applies it destructively — per zone, delete everything (signatures
//! included) and re-insert what the master sent. Errors are confined to
//! their granularity: a bad line skips the line, a bad zone skips the zone,
//! a failed fetch skips the cycle. The next cycle starts over from the
//! export, so partial refreshes heal themselves.

use crate::api::ZoneFile;
use crate::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use signet_cache::RecordCache;
use signet_proto::{RData, ResourceRecord};
use signet_store::ZoneStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The replication slave.
pub struct SlaveSync {
    store: Arc<dyn ZoneStore>,
    cache: Arc<RecordCache>,
    client: reqwest::Client,
    last_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl SlaveSync {
    /// Creates the slave loop.
    pub fn new(
        store: Arc<dyn ZoneStore>,
        cache: Arc<RecordCache>,
        last_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
    ) -> Self {
        Self {
            store,
            cache,
            client: reqwest::Client::new(),
            last_sync,
        }
    }

    /// Resets local state before the first cycle.
    ///
    /// A failure here is fatal: a slave that cannot clear its store must
    /// not serve stale data as if it were mirrored.
    pub async fn reset(&self) -> std::result::Result<(), signet_store::StoreError> {
        self.store.truncate_all().await?;
        self.cache.clear();
        *self.last_sync.write() = Some(Utc::now());
        info!("Slave store truncated, starting from empty");
        Ok(())
    }

    /// Runs sync cycles forever: one immediately, then one per interval.
    pub async fn run(self, master_url: String, interval: Duration) -> Result<()> {
        loop {
            self.sync_once(&master_url).await;
            tokio::time::sleep(interval).await;
        }
    }

    /// Runs a single best-effort sync cycle.
    pub async fn sync_once(&self, master_url: &str) {
        let response = match self.client.get(master_url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, url = %master_url, "Failed to contact master, skipping cycle");
                return;
            }
        };

        let zones: Vec<ZoneFile> = match response.json().await {
            Ok(zones) => zones,
            Err(err) => {
                warn!(%err, "Failed to decode master response, skipping cycle");
                return;
            }
        };

        let synced = self.apply(&zones).await;
        self.cache.clear();
        *self.last_sync.write() = Some(Utc::now());
        info!(zones = synced, "Synced zones from master");
    }

    /// Applies a decoded export, returning the number of zones refreshed.
    pub async fn apply(&self, zones: &[ZoneFile]) -> usize {
        let mut synced = 0;

        for zone_file in zones {
            let Ok(apex) = zone_file.zone.parse::<signet_proto::Name>() else {
                warn!(zone = %zone_file.zone, "Skipping zone with invalid apex");
                continue;
            };

            let zone_id = match self.store.insert_zone(&apex).await {
                Ok(id) => id,
                Err(err) => {
                    warn!(zone = %apex, %err, "Could not insert zone");
                    continue;
                }
            };

            // Destructive refresh: drop the zone's records and signatures,
            // then replay the master's lines.
            if let Err(err) = self.store.delete_zone_records(zone_id).await {
                warn!(zone = %apex, %err, "Could not clear zone before refresh");
                continue;
            }

            for line in &zone_file.records {
                let rr: ResourceRecord = match line.parse() {
                    Ok(rr) => rr,
                    Err(err) => {
                        warn!(zone = %apex, %line, %err, "Skipping invalid record line");
                        continue;
                    }
                };

                let result = if let RData::RRSIG(sig) = rr.rdata() {
                    // Signatures are keyed by the type they cover.
                    self.store
                        .store_rrsig(rr.name(), sig.type_covered(), &rr)
                        .await
                } else {
                    self.store.upsert_record(&rr).await
                };

                if let Err(err) = result {
                    warn!(zone = %apex, %line, %err, "Failed to apply record line");
                }
            }

            synced += 1;
        }

        synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::export_zones;
    use crate::testutil::MockStore;
    use signet_proto::{Name, RecordType};

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn slave(store: Arc<MockStore>) -> SlaveSync {
        SlaveSync::new(
            store,
            Arc::new(RecordCache::new()),
            Arc::new(RwLock::new(None)),
        )
    }

    async fn seeded_master() -> Arc<MockStore> {
        let master = Arc::new(MockStore::new());
        for zone in ["a.test.", "b.test."] {
            master.insert_zone(&name(zone)).await.unwrap();
        }
        for line in [
            "www.a.test. 300 IN A 1.1.1.1",
            "www.a.test. 300 IN A 2.2.2.2",
            "a.test. 600 IN MX 10 mx.a.test.",
            "b.test. 60 IN TXT hello",
        ] {
            master
                .upsert_record(&line.parse().unwrap())
                .await
                .unwrap();
        }
        let sig: ResourceRecord =
            "www.a.test. 300 IN RRSIG A 8 3 300 20330101000000 20250101000000 11 a.test. qqqqqqqqqqqqqqqqqqqqqg=="
                .parse()
                .unwrap();
        master
            .store_rrsig(&name("www.a.test."), RecordType::A, &sig)
            .await
            .unwrap();
        master
    }

    #[tokio::test]
    async fn apply_mirrors_the_export() {
        let master = seeded_master().await;
        let export = export_zones(master.as_ref()).await.unwrap();
        assert_eq!(export.len(), 2);

        let store = Arc::new(MockStore::new());
        let slave = slave(store.clone());
        let synced = slave.apply(&export).await;
        assert_eq!(synced, 2);

        // Identical (name, type, data) multisets on both sides.
        assert_eq!(store.record_tuples(), master.record_tuples());

        // The replicated signature is findable under its covered type.
        let sig = store
            .query_rrsig(&name("www.a.test."), RecordType::A)
            .await
            .unwrap();
        assert!(sig.is_some());
    }

    #[tokio::test]
    async fn export_apply_export_is_a_fixed_point() {
        let master = seeded_master().await;
        let export = export_zones(master.as_ref()).await.unwrap();

        let store = Arc::new(MockStore::new());
        let slave = slave(store.clone());
        slave.apply(&export).await;

        let re_export = export_zones(store.as_ref()).await.unwrap();
        let canonical = |mut zones: Vec<ZoneFile>| -> Vec<(String, Vec<String>)> {
            zones.sort_by(|a, b| a.zone.cmp(&b.zone));
            zones
                .into_iter()
                .map(|z| {
                    let mut records = z.records;
                    records.sort();
                    (z.zone, records)
                })
                .collect()
        };
        assert_eq!(canonical(re_export), canonical(export));
    }

    #[tokio::test]
    async fn two_cycles_without_change_are_identical() {
        let master = seeded_master().await;
        let export = export_zones(master.as_ref()).await.unwrap();

        let store = Arc::new(MockStore::new());
        let slave = slave(store.clone());
        slave.apply(&export).await;
        let first = (store.record_tuples(), store.rrsig_tuples());

        slave.apply(&export).await;
        let second = (store.record_tuples(), store.rrsig_tuples());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn destructive_refresh_drops_records_gone_from_master() {
        let store = Arc::new(MockStore::new());
        let slave = slave(store.clone());

        let stale = vec![ZoneFile {
            zone: "a.test.".to_string(),
            records: vec![
                "old.a.test. 300 IN A 9.9.9.9".to_string(),
                "old.a.test. 300 IN RRSIG A 8 3 300 20330101000000 20250101000000 11 a.test. qqqqqqqqqqqqqqqqqqqqqg==".to_string(),
            ],
        }];
        slave.apply(&stale).await;
        assert_eq!(store.record_tuples().len(), 1);
        assert_eq!(store.rrsig_tuples().len(), 1);

        let fresh = vec![ZoneFile {
            zone: "a.test.".to_string(),
            records: vec!["new.a.test. 300 IN A 1.2.3.4".to_string()],
        }];
        slave.apply(&fresh).await;

        let tuples = store.record_tuples();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].0, "new.a.test.");
        assert!(store.rrsig_tuples().is_empty(), "old signature must go too");
    }

    #[tokio::test]
    async fn bad_lines_do_not_abort_the_zone() {
        let store = Arc::new(MockStore::new());
        let slave = slave(store.clone());

        let export = vec![ZoneFile {
            zone: "a.test.".to_string(),
            records: vec![
                "not a record at all @@@".to_string(),
                "www.a.test. 300 IN A 1.2.3.4".to_string(),
            ],
        }];
        let synced = slave.apply(&export).await;
        assert_eq!(synced, 1);
        assert_eq!(store.record_tuples().len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_store_cache_and_stamps_last_sync() {
        let store = Arc::new(MockStore::new());
        store.insert_zone(&name("a.test.")).await.unwrap();
        store
            .upsert_record(&"www.a.test. 300 IN A 1.1.1.1".parse().unwrap())
            .await
            .unwrap();

        let cache = Arc::new(RecordCache::new());
        cache.set(&name("www.a.test."), RecordType::A, Vec::new());
        let last_sync = Arc::new(RwLock::new(None));

        let slave = SlaveSync::new(store.clone(), cache.clone(), last_sync.clone());
        slave.reset().await.unwrap();

        assert!(store.record_tuples().is_empty());
        assert!(store.zone_names().await.unwrap().is_empty());
        assert!(cache.is_empty());
        assert!(last_sync.read().is_some());
    }
}

//! HTTP API: the master's zone export and the status probe.
//!
//! `GET /zone-sync` (master only) serializes every zone as presentation
//! lines — records first, each RRset's stored signature after — for the
//! slave loop to re-ingest. `GET /status` reports the role plus role-
//! specific liveness detail. Plain HTTP, no authentication; replication
//! transport security is out of scope.

use crate::{Role, ServerError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use signet_dnssec::KeyStore;
use signet_proto::Name;
use signet_store::{StoreError, ZoneStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// One zone in the replication envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneFile {
    /// Zone apex name.
    pub zone: String,
    /// Presentation lines: records and RRSIGs.
    pub records: Vec<String>,
}

/// Shared state behind the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The record store.
    pub store: Arc<dyn ZoneStore>,
    /// Loaded signing keys (empty on slaves).
    pub keystore: Arc<KeyStore>,
    /// This process's replication role.
    pub role: Role,
    /// When the slave last completed a sync cycle.
    pub last_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
}

/// The HTTP API server.
pub struct ApiServer {
    state: ApiState,
}

impl ApiServer {
    /// Creates the server for the given state.
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }

    /// Builds the router; `/zone-sync` is only exposed on masters.
    fn router(&self) -> Router {
        let mut router = Router::new().route("/status", get(status));
        if self.state.role == Role::Master {
            router = router.route("/zone-sync", get(zone_sync));
        }
        router.with_state(self.state.clone())
    }

    /// Binds and serves until the process exits.
    pub async fn run(self, addr: SocketAddr) -> crate::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, role = %self.state.role, "HTTP API listening");
        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Io)
    }
}

/// Collects the full export envelope from the store.
///
/// Zones with no records are omitted. Per-zone failures skip that zone and
/// keep the export going.
pub async fn export_zones(store: &dyn ZoneStore) -> Result<Vec<ZoneFile>, StoreError> {
    let zones = store.zone_names().await?;
    let mut out = Vec::with_capacity(zones.len());

    for zone in zones {
        let Ok(apex) = zone.parse::<Name>() else {
            warn!(zone = %zone, "Skipping zone with unparsable apex");
            continue;
        };

        let keys = match store.rrset_keys_for_zone(&apex).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(zone = %zone, %err, "Skipping zone in export");
                continue;
            }
        };

        let mut records = Vec::new();
        for key in keys {
            match store.query_records(&key.name, key.rtype).await {
                Ok(rrset) => records.extend(rrset.iter().map(ToString::to_string)),
                Err(err) => {
                    warn!(name = %key.name, rtype = %key.rtype, %err, "Skipping RRset in export");
                    continue;
                }
            }
            if let Ok(Some(sig)) = store.query_rrsig(&key.name, key.rtype).await {
                records.push(sig.to_string());
            }
        }

        if !records.is_empty() {
            out.push(ZoneFile { zone, records });
        }
    }

    Ok(out)
}

async fn zone_sync(State(state): State<ApiState>) -> Result<Json<Vec<ZoneFile>>, StatusCode> {
    match export_zones(state.store.as_ref()).await {
        Ok(zones) => Ok(Json(zones)),
        Err(err) => {
            error!(%err, "Zone export failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn status(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let mut body = json!({ "role": state.role.to_string() });

    match state.role {
        Role::Master => {
            let mut dnssec_zones: Vec<String> =
                state.keystore.zones().map(ToString::to_string).collect();
            dnssec_zones.sort();
            body["dnssec_zones"] = json!(dnssec_zones);
            body["db_zones"] = json!(state.store.zone_names().await.unwrap_or_default());
        }
        Role::Slave => {
            let last_sync = *state.last_sync.read();
            body["last_sync"] = json!(last_sync
                .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                .unwrap_or_default());
        }
    }

    Json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockStore;
    use signet_store::ZoneStore;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn export_emits_records_then_signature_and_skips_empty_zones() {
        let store = MockStore::new();
        store.insert_zone(&name("a.test.")).await.unwrap();
        store.insert_zone(&name("b.test.")).await.unwrap();
        store.insert_zone(&name("empty.test.")).await.unwrap();

        store
            .upsert_record(&"www.a.test. 300 IN A 1.1.1.1".parse().unwrap())
            .await
            .unwrap();
        store
            .upsert_record(&"www.a.test. 300 IN A 2.2.2.2".parse().unwrap())
            .await
            .unwrap();
        store
            .upsert_record(&"b.test. 60 IN TXT hello".parse().unwrap())
            .await
            .unwrap();

        let sig: signet_proto::ResourceRecord =
            "www.a.test. 300 IN RRSIG A 8 3 300 20330101000000 20250101000000 11 a.test. qqqqqqqqqqqqqqqqqqqqqg=="
                .parse()
                .unwrap();
        store
            .store_rrsig(&name("www.a.test."), signet_proto::RecordType::A, &sig)
            .await
            .unwrap();

        let export = export_zones(&store).await.unwrap();
        assert_eq!(export.len(), 2, "empty zone must be omitted");

        let a = export.iter().find(|z| z.zone == "a.test.").unwrap();
        assert_eq!(a.records.len(), 3);
        assert!(a.records[2].contains("RRSIG"));

        let b = export.iter().find(|z| z.zone == "b.test.").unwrap();
        assert_eq!(b.records, vec!["b.test. 60 IN TXT \"hello\"".to_string()]);
    }

    #[tokio::test]
    async fn exported_lines_parse_back() {
        let store = MockStore::new();
        store.insert_zone(&name("a.test.")).await.unwrap();
        store
            .upsert_record(&"mail.a.test. 300 IN MX 10 mx.a.test.".parse().unwrap())
            .await
            .unwrap();

        let export = export_zones(&store).await.unwrap();
        for zone in &export {
            for line in &zone.records {
                assert!(
                    line.parse::<signet_proto::ResourceRecord>().is_ok(),
                    "{line}"
                );
            }
        }
    }
}

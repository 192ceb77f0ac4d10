//! # Signet Record Store
//!
//! Persistence for zones, resource records and RRSIGs over PostgreSQL.
//!
//! The [`ZoneStore`] trait mirrors the store's operation set so the query
//! handler and the replication loop can run against mocks in tests;
//! [`PgStore`] is the production implementation. Records are persisted with
//! their rdata in a deterministic textual form (see [`serialize_rdata`]) so
//! the `(name, type, data)` uniqueness key is meaningful and a slave can
//! reconstruct byte-identical presentation lines.

pub mod migrate;
pub mod watcher;

pub use migrate::migrate;
pub use watcher::ChangeWatcher;

use async_trait::async_trait;
use signet_proto::{Name, ProtoError, RData, RecordType, ResourceRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected or failed an operation.
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// The store cannot be reached.
    #[error("store unavailable")]
    Unavailable,

    /// No zone's apex is a suffix of the record owner.
    #[error("no zone found for owner {owner}")]
    ZoneNotFound {
        /// The owner name that could not be attributed.
        owner: String,
    },

    /// Stored or incoming record text could not be parsed.
    #[error("record parse error: {0}")]
    Parse(#[from] ProtoError),

    /// The rdata has no serializable presentation form.
    #[error("cannot serialize rdata of {0}")]
    RdataFormat(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The `(owner name, type)` identity of one RRset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRsetKey {
    /// Owner name.
    pub name: Name,
    /// Record type.
    pub rtype: RecordType,
}

/// The persistence operations the server cores depend on.
///
/// Implemented by [`PgStore`] in production and by in-memory mocks in the
/// handler and sync-loop tests.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Upserts a zone by apex name, returning its stable id.
    async fn insert_zone(&self, name: &Name) -> Result<i32>;

    /// Returns every zone apex name.
    async fn zone_names(&self) -> Result<Vec<String>>;

    /// Returns every `(owner, type)` RRset key of a zone's records.
    async fn rrset_keys_for_zone(&self, zone: &Name) -> Result<Vec<RRsetKey>>;

    /// Returns all records of one RRset, reconstituted from stored text.
    async fn query_records(&self, name: &Name, rtype: RecordType) -> Result<Vec<ResourceRecord>>;

    /// Returns the signature covering an RRset, if one is stored.
    async fn query_rrsig(&self, name: &Name, covered: RecordType)
        -> Result<Option<ResourceRecord>>;

    /// Inserts a record, or refreshes its TTL if the `(name, type, data)`
    /// tuple already exists. The owning zone is the longest zone-name suffix
    /// of the owner.
    async fn upsert_record(&self, rr: &ResourceRecord) -> Result<()>;

    /// Upserts the signature covering `(name, covered)`.
    async fn store_rrsig(&self, name: &Name, covered: RecordType, rr: &ResourceRecord)
        -> Result<()>;

    /// Deletes a zone's records and their signatures.
    async fn delete_zone_records(&self, zone_id: i32) -> Result<()>;

    /// Wipes zones, records and signatures, resetting identity sequences.
    async fn truncate_all(&self) -> Result<()>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database and prepares a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the schema migration.
    pub async fn migrate(&self) -> Result<()> {
        migrate::migrate(&self.pool).await
    }
}

#[async_trait]
impl ZoneStore for PgStore {
    async fn insert_zone(&self, name: &Name) -> Result<i32> {
        let apex = name.lowercased().to_string();
        let row = sqlx::query(
            "INSERT INTO zones (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(&apex)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i32, _>("id"))
    }

    async fn zone_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM zones ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>("name")).collect())
    }

    async fn rrset_keys_for_zone(&self, zone: &Name) -> Result<Vec<RRsetKey>> {
        let dotted = zone.lowercased().to_string();
        // Tolerate an apex that was stored without its trailing dot.
        let undotted = dotted.trim_end_matches('.').to_string();

        let rows = sqlx::query(
            "SELECT DISTINCT r.name, r.type FROM records r
             JOIN zones z ON r.zone_id = z.id
             WHERE z.name = $1 OR z.name = $2",
        )
        .bind(&dotted)
        .bind(&undotted)
        .fetch_all(&self.pool)
        .await?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            let name_text: String = row.get("name");
            let type_text: String = row.get("type");
            match (name_text.parse::<Name>(), type_text.parse::<RecordType>()) {
                (Ok(name), Ok(rtype)) => keys.push(RRsetKey { name, rtype }),
                _ => warn!(name = %name_text, rtype = %type_text, "Skipping unparsable RRset key"),
            }
        }
        Ok(keys)
    }

    async fn query_records(&self, name: &Name, rtype: RecordType) -> Result<Vec<ResourceRecord>> {
        let owner = name.lowercased().to_string();
        let rows = sqlx::query(
            "SELECT type, ttl, data FROM records WHERE name = $1 AND type = $2",
        )
        .bind(&owner)
        .bind(rtype.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let type_text: String = row.get("type");
            let ttl: i32 = row.get("ttl");
            let data: String = row.get("data");

            let line = format!("{owner} {ttl} IN {type_text} {data}");
            match line.parse::<ResourceRecord>() {
                Ok(rr) => records.push(rr),
                Err(err) => warn!(%line, %err, "Skipping unparsable stored record"),
            }
        }
        Ok(records)
    }

    async fn query_rrsig(
        &self,
        name: &Name,
        covered: RecordType,
    ) -> Result<Option<ResourceRecord>> {
        let owner = name.lowercased().to_string();
        let row = sqlx::query(
            "SELECT rrsig FROM dnssec_rrsigs WHERE name = $1 AND type_covered = $2",
        )
        .bind(&owner)
        .bind(covered.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let text: String = row.get("rrsig");
                Ok(Some(text.parse::<ResourceRecord>()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_record(&self, rr: &ResourceRecord) -> Result<()> {
        let owner = rr.name().lowercased();
        let data = serialize_rdata(rr)?;

        let zone_rows = sqlx::query("SELECT id, name FROM zones")
            .fetch_all(&self.pool)
            .await?;
        let mut zones = Vec::with_capacity(zone_rows.len());
        for row in zone_rows {
            let id: i32 = row.get("id");
            let name_text: String = row.get("name");
            if let Ok(name) = name_text.parse::<Name>() {
                zones.push((id, name));
            }
        }

        let (zone_id, zone) = longest_zone_suffix(&owner, &zones)
            .ok_or_else(|| StoreError::ZoneNotFound {
                owner: owner.to_string(),
            })?;
        debug!(owner = %owner, zone = %zone, rtype = %rr.rtype(), "Upserting record");

        sqlx::query(
            "INSERT INTO records (zone_id, name, type, ttl, data)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (name, type, data) DO UPDATE SET ttl = EXCLUDED.ttl",
        )
        .bind(zone_id)
        .bind(owner.to_string())
        .bind(rr.rtype().to_string())
        .bind(rr.ttl() as i32)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn store_rrsig(
        &self,
        name: &Name,
        covered: RecordType,
        rr: &ResourceRecord,
    ) -> Result<()> {
        let owner = name.lowercased().to_string();
        sqlx::query(
            "INSERT INTO dnssec_rrsigs (name, type_covered, rrsig)
             VALUES ($1, $2, $3)
             ON CONFLICT (name, type_covered) DO UPDATE SET rrsig = EXCLUDED.rrsig",
        )
        .bind(&owner)
        .bind(covered.to_string())
        .bind(rr.with_lowercase_name().to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_zone_records(&self, zone_id: i32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Signatures go first: they are keyed by owner name, not zone id.
        sqlx::query(
            "DELETE FROM dnssec_rrsigs
             WHERE name IN (SELECT name FROM records WHERE zone_id = $1)",
        )
        .bind(zone_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM records WHERE zone_id = $1")
            .bind(zone_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn truncate_all(&self) -> Result<()> {
        sqlx::query("TRUNCATE TABLE dnssec_rrsigs, records, zones RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Picks the zone whose apex is the longest suffix of `owner`.
///
/// With both `example.com.` and `b.example.com.` loaded, a record at
/// `www.b.example.com.` belongs to the longer zone.
pub fn longest_zone_suffix<'a>(owner: &Name, zones: &'a [(i32, Name)]) -> Option<(i32, &'a Name)> {
    zones
        .iter()
        .filter(|(_, zone)| owner.ends_with(zone))
        .max_by_key(|(_, zone)| zone.label_count())
        .map(|(id, zone)| (*id, zone))
}

/// Serializes rdata to the deterministic text kept in the `data` column.
///
/// Explicit encoders cover the types this server works with; everything else
/// falls back to the presentation form with its first four fields (owner,
/// TTL, class, type) stripped, which may be lossy for exotic types.
pub fn serialize_rdata(rr: &ResourceRecord) -> Result<String> {
    Ok(match rr.rdata() {
        RData::A(r) => r.to_string(),
        RData::AAAA(r) => r.to_string(),
        RData::CNAME(r) => r.target().to_string(),
        RData::NS(r) => r.nsdname().to_string(),
        RData::MX(r) => format!("{} {}", r.preference(), r.exchange()),
        RData::TXT(r) => r.strings().join(" "),
        RData::DNSKEY(r) => r.to_string(),
        _ => {
            let line = rr.to_string();
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return Err(StoreError::RdataFormat(rr.rtype().to_string()));
            }
            fields[4..].join(" ")
        }
    })
}

//! Schema migration.
//!
//! Creates the zones/records/dnssec_rrsigs tables, their uniqueness
//! constraints, and the `record_change` NOTIFY triggers. Every statement is
//! idempotent so the migration can run on each boot.

use crate::Result;
use sqlx::PgPool;
use tracing::info;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS zones (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        ttl INT DEFAULT 3600
    )",
    "CREATE TABLE IF NOT EXISTS records (
        id SERIAL PRIMARY KEY,
        zone_id INT REFERENCES zones(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        ttl INT DEFAULT 3600,
        data TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_records_unique ON records(name, type, data)",
    "CREATE INDEX IF NOT EXISTS idx_records_name_type ON records(name, type)",
    // The zone-scoped uniqueness key; added via DO block because ALTER TABLE
    // ADD CONSTRAINT has no IF NOT EXISTS form.
    "DO $$ BEGIN
        ALTER TABLE records ADD CONSTRAINT unique_record_entry UNIQUE (zone_id, name, type, data);
    EXCEPTION
        WHEN duplicate_table THEN NULL;
        WHEN duplicate_object THEN NULL;
    END $$",
    "CREATE TABLE IF NOT EXISTS dnssec_rrsigs (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        type_covered TEXT NOT NULL,
        rrsig TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_rrsig_name_type ON dnssec_rrsigs(name, type_covered)",
    "CREATE OR REPLACE FUNCTION notify_record_change()
        RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify('record_change', '');
            RETURN NULL;
        END;
    $$ LANGUAGE plpgsql",
    "DROP TRIGGER IF EXISTS record_insert ON records",
    "CREATE TRIGGER record_insert AFTER INSERT ON records
        FOR EACH STATEMENT EXECUTE FUNCTION notify_record_change()",
    "DROP TRIGGER IF EXISTS record_update ON records",
    "CREATE TRIGGER record_update AFTER UPDATE ON records
        FOR EACH STATEMENT EXECUTE FUNCTION notify_record_change()",
    "DROP TRIGGER IF EXISTS record_delete ON records",
    "CREATE TRIGGER record_delete AFTER DELETE ON records
        FOR EACH STATEMENT EXECUTE FUNCTION notify_record_change()",
];

/// Applies the schema. Safe to run repeatedly.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema migration completed");
    Ok(())
}

//! Offline key and signing tools.
//!
//! These run as `signetd` subcommands against the same store and secrets
//! layout as the server:
//!
//! - `genkey <zone>` creates `secrets/<zone>/{key.pem,dnskey.txt}` and
//!   publishes the DNSKEY into the records table.
//! - `sign-zone <zone>` (re)signs every RRset of one zone.
//! - `resign-all` does that for every zone with a loaded keypair.

use anyhow::{bail, Context, Result};
use signet_dnssec::{sign_rrset, KeyStore};
use signet_proto::Name;
use signet_store::{PgStore, ZoneStore};
use std::path::Path;
use tracing::{info, warn};

/// Default TTL for generated DNSKEY records.
const DNSKEY_TTL: u32 = 3600;

/// RSA modulus size for generated keys.
const KEY_BITS: usize = 2048;

/// Generates a keypair for `zone` and publishes its DNSKEY.
pub async fn genkey(store: &PgStore, secrets_dir: &Path, zone: &str) -> Result<()> {
    let zone: Name = zone
        .parse()
        .with_context(|| format!("invalid zone name {zone:?}"))?;
    let zone = zone.lowercased();

    let generated = signet_dnssec::generate(&zone, DNSKEY_TTL, KEY_BITS)
        .context("key generation failed")?;

    let zone_dir = secrets_dir.join(zone.to_string());
    std::fs::create_dir_all(&zone_dir)
        .with_context(|| format!("creating {}", zone_dir.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&zone_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    std::fs::write(zone_dir.join("key.pem"), &generated.private_key_pem)?;
    std::fs::write(
        zone_dir.join("dnskey.txt"),
        format!("{}\n", generated.dnskey),
    )?;
    info!(zone = %zone, dir = %zone_dir.display(), "Key pair written");

    store.insert_zone(&zone).await?;
    store.upsert_record(&generated.dnskey).await?;
    info!(zone = %zone, "DNSKEY inserted into records");

    Ok(())
}

/// (Re)signs every RRset of `zone` using the loaded keystore.
pub async fn sign_zone(store: &PgStore, keystore: &KeyStore, zone: &str) -> Result<()> {
    let zone: Name = zone
        .parse()
        .with_context(|| format!("invalid zone name {zone:?}"))?;
    let zone = zone.lowercased();

    let Some(keypair) = keystore.get(&zone) else {
        bail!("no keypair loaded for zone {zone}");
    };

    let signed = sign_zone_rrsets(store, &zone, keypair).await?;
    info!(zone = %zone, signed, "Zone signed");
    Ok(())
}

/// Re-signs every zone that has a keypair loaded.
pub async fn resign_all(store: &PgStore, keystore: &KeyStore) -> Result<()> {
    let mut total = 0;
    let mut zones = 0;

    for zone in keystore.zones() {
        let Some(keypair) = keystore.get(zone) else {
            continue;
        };
        match sign_zone_rrsets(store, zone, keypair).await {
            Ok(signed) => {
                total += signed;
                zones += 1;
            }
            Err(err) => warn!(zone = %zone, %err, "Skipping zone"),
        }
    }

    info!(signatures = total, zones, "Re-signing complete");
    Ok(())
}

/// Signs each RRset of one zone, storing the signatures.
///
/// Individual RRset failures are logged and skipped; the count of stored
/// signatures is returned.
async fn sign_zone_rrsets(
    store: &PgStore,
    zone: &Name,
    keypair: &signet_dnssec::KeyPair,
) -> Result<usize> {
    let keys = store
        .rrset_keys_for_zone(zone)
        .await
        .with_context(|| format!("listing RRsets of {zone}"))?;

    let mut signed = 0;
    for key in keys {
        let rrset = match store.query_records(&key.name, key.rtype).await {
            Ok(rrset) if !rrset.is_empty() => rrset,
            Ok(_) => continue,
            Err(err) => {
                warn!(name = %key.name, rtype = %key.rtype, %err, "Skipping RRset");
                continue;
            }
        };

        let sig = match sign_rrset(&rrset, zone, keypair) {
            Ok(sig) => sig,
            Err(err) => {
                warn!(name = %key.name, rtype = %key.rtype, %err, "Sign error");
                continue;
            }
        };

        match store.store_rrsig(&key.name, key.rtype, &sig).await {
            Ok(()) => {
                info!(name = %key.name, rtype = %key.rtype, "Signed");
                signed += 1;
            }
            Err(err) => warn!(name = %key.name, rtype = %key.rtype, %err, "Store RRSIG error"),
        }
    }

    Ok(signed)
}

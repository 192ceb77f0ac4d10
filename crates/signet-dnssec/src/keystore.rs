//! Per-zone keypair loading.
//!
//! The secrets directory holds one subdirectory per zone apex (the directory
//! name, with a trailing dot implied). Each must contain:
//!
//! - `key.pem` — PEM-wrapped PKCS#1 RSA private key
//! - `dnskey.txt` — the zone's DNSKEY RR in presentation format
//!
//! Entries that fail to load are skipped with a warning; the zone is then
//! served unsigned. Loaded keys never change for the process lifetime.

use crate::{DnssecError, Result};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::RsaPrivateKey;
use signet_proto::{rdata, Name, RData, ResourceRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// An RSA private key with its published DNSKEY record.
pub struct KeyPair {
    key: RsaPrivateKey,
    dnskey_record: ResourceRecord,
    dnskey: rdata::DNSKEY,
    key_tag: u16,
}

impl KeyPair {
    /// Builds a keypair from its parts, checking that the record is a DNSKEY.
    pub fn new(key: RsaPrivateKey, dnskey_record: ResourceRecord) -> Result<Self> {
        let RData::DNSKEY(dnskey) = dnskey_record.rdata().clone() else {
            return Err(DnssecError::NotDnskey(dnskey_record.to_string()));
        };
        let key_tag = dnskey.key_tag();
        Ok(Self {
            key,
            dnskey_record,
            dnskey,
            key_tag,
        })
    }

    /// Returns the private key.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// Returns the published DNSKEY resource record.
    pub fn dnskey_record(&self) -> &ResourceRecord {
        &self.dnskey_record
    }

    /// Returns the DNSKEY rdata.
    pub fn dnskey(&self) -> &rdata::DNSKEY {
        &self.dnskey
    }

    /// Returns the signature algorithm declared by the DNSKEY.
    pub fn algorithm(&self) -> u8 {
        self.dnskey.algorithm()
    }

    /// Returns the key tag of the public key.
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }
}

/// All zone keypairs, loaded once at startup.
#[derive(Default)]
pub struct KeyStore {
    keys: HashMap<Name, KeyPair>,
}

impl KeyStore {
    /// Creates an empty keystore (slaves run without keys).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every zone subdirectory of `secrets_dir`.
    ///
    /// Fails only if the directory itself cannot be read; individual zones
    /// that fail to load are skipped.
    pub fn load(secrets_dir: impl AsRef<Path>) -> Result<Self> {
        let secrets_dir = secrets_dir.as_ref();
        let mut keys = HashMap::new();

        for entry in std::fs::read_dir(secrets_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(%err, "Skipping unreadable secrets entry");
                    continue;
                }
            };
            if !entry.path().is_dir() {
                continue;
            }

            let dir_name = entry.file_name();
            let Ok(zone) = dir_name.to_string_lossy().parse::<Name>() else {
                warn!(dir = %dir_name.to_string_lossy(), "Skipping secrets dir with invalid zone name");
                continue;
            };
            let zone = zone.lowercased();

            match load_keypair(&entry.path()) {
                Ok(keypair) => {
                    info!(zone = %zone, key_tag = keypair.key_tag(), "Loaded zone signing key");
                    keys.insert(zone, keypair);
                }
                Err(err) => {
                    warn!(zone = %zone, %err, "Skipping zone with unloadable keypair");
                }
            }
        }

        Ok(Self { keys })
    }

    /// Returns the keypair for a zone apex, if loaded.
    pub fn get(&self, zone: &Name) -> Option<&KeyPair> {
        self.keys.get(&zone.lowercased())
    }

    /// Returns every loaded zone apex.
    pub fn zones(&self) -> impl Iterator<Item = &Name> {
        self.keys.keys()
    }

    /// Returns the loaded zone whose apex is the longest suffix of `qname`.
    ///
    /// Apices are unique, so ties cannot occur.
    pub fn best_match(&self, qname: &Name) -> Option<(&Name, &KeyPair)> {
        self.keys
            .iter()
            .filter(|(zone, _)| qname.ends_with(zone))
            .max_by_key(|(zone, _)| zone.label_count())
    }

    /// Returns the number of loaded keypairs.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keypairs are loaded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn load_keypair(dir: &Path) -> Result<KeyPair> {
    let pem = std::fs::read_to_string(dir.join("key.pem"))?;
    let key = RsaPrivateKey::from_pkcs1_pem(&pem)?;

    let dnskey_text = std::fs::read_to_string(dir.join("dnskey.txt"))?;
    let record: ResourceRecord = dnskey_text
        .trim()
        .parse()
        .map_err(|_| DnssecError::NotDnskey(dnskey_text.trim().to_string()))?;

    KeyPair::new(key, record)
}

//! Offline key generation.
//!
//! Produces an RSA keypair for a zone: the PKCS#1 PEM private key destined
//! for `secrets/<zone>/key.pem` and the matching DNSKEY record (flags 256,
//! protocol 3, RSASHA256) for `dnskey.txt` and the records table. The
//! DNSKEY public key uses the RFC 3110 exponent-then-modulus encoding, so
//! signatures made with the private key verify against the published record.

use crate::{KeyPair, Result, ALG_RSASHA256};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use signet_proto::{rdata, Class, Name, RData, ResourceRecord};

/// A freshly generated zone key.
pub struct GeneratedKey {
    /// PKCS#1 PEM encoding of the private key.
    pub private_key_pem: String,
    /// The publishable DNSKEY resource record.
    pub dnskey: ResourceRecord,
    key: RsaPrivateKey,
}

impl GeneratedKey {
    /// Converts into a loaded [`KeyPair`], as the keystore would produce.
    pub fn into_keypair(self) -> Result<KeyPair> {
        KeyPair::new(self.key, self.dnskey)
    }
}

/// Generates an RSA keypair and DNSKEY for `zone`.
///
/// `bits` is the modulus size; the key generator tool uses 2048.
pub fn generate(zone: &Name, ttl: u32, bits: usize) -> Result<GeneratedKey> {
    let mut rng = rand::rngs::OsRng;
    let key = RsaPrivateKey::new(&mut rng, bits)?;
    let public = RsaPublicKey::from(&key);

    let dnskey = rdata::DNSKEY::new(
        rdata::DNSKEY::FLAG_ZONE_KEY,
        3,
        ALG_RSASHA256,
        rfc3110_public_key(&public),
    );
    let record = ResourceRecord::new(zone.lowercased(), Class::IN, ttl, RData::DNSKEY(dnskey));

    let private_key_pem = key.to_pkcs1_pem(LineEnding::LF)?.to_string();

    Ok(GeneratedKey {
        private_key_pem,
        dnskey: record,
        key,
    })
}

/// Encodes an RSA public key per RFC 3110: exponent length, exponent,
/// modulus. The three-byte length form only applies to exponents longer
/// than 255 octets, which real-world keys never use.
fn rfc3110_public_key(public: &RsaPublicKey) -> Vec<u8> {
    let exponent = public.e().to_bytes_be();
    let modulus = public.n().to_bytes_be();

    let mut out = Vec::with_capacity(3 + exponent.len() + modulus.len());
    if exponent.len() < 256 {
        out.push(exponent.len() as u8);
    } else {
        out.push(0);
        out.extend_from_slice(&(exponent.len() as u16).to_be_bytes());
    }
    out.extend_from_slice(&exponent);
    out.extend_from_slice(&modulus);
    out
}

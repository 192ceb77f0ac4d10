//! Online RRSIG production.
//!
//! The signature input follows RFC 4034 section 3.1.8.1: the RRSIG RDATA
//! with the signature field elided, followed by the covered RRset in
//! canonical form — owner names lowercased, the original TTL substituted,
//! RDATA canonically encoded, records sorted by that encoding.

use crate::{DnssecError, KeyPair, Result, ALG_RSASHA256, ALG_RSASHA512};
use bytes::BytesMut;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256, Sha512};
use signet_proto::{rdata, Class, Name, RData, ResourceRecord};
use std::time::{SystemTime, UNIX_EPOCH};

/// Signature validity window start: 5 minutes before now.
const INCEPTION_SKEW_SECS: u32 = 300;

/// Signature validity window end: 24 hours after now.
const VALIDITY_SECS: u32 = 86_400;

/// Signs an RRset with a zone's keypair, using the current time.
///
/// The signature is valid from five minutes in the past to 24 hours in the
/// future, carried as 32-bit Unix seconds.
pub fn sign_rrset(rrset: &[ResourceRecord], zone: &Name, keypair: &KeyPair) -> Result<ResourceRecord> {
    sign_rrset_at(rrset, zone, keypair, unix_now())
}

/// Signs an RRset with an explicit `now`, for deterministic tests.
pub fn sign_rrset_at(
    rrset: &[ResourceRecord],
    zone: &Name,
    keypair: &KeyPair,
    now: u32,
) -> Result<ResourceRecord> {
    let first = rrset.first().ok_or(DnssecError::EmptyRrset)?;
    let owner = first.name().lowercased();
    let signer = zone.lowercased();

    let rrsig = rdata::RRSIG::new(
        first.rtype(),
        keypair.algorithm(),
        owner.label_count() as u8,
        first.ttl(),
        now.wrapping_add(VALIDITY_SECS),
        now.wrapping_sub(INCEPTION_SKEW_SECS),
        keypair.key_tag(),
        signer,
        Vec::new(),
    );

    let input = signature_input(&rrsig, rrset);
    let signature = match keypair.algorithm() {
        ALG_RSASHA256 => {
            let digest = Sha256::digest(&input);
            keypair
                .private_key()
                .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?
        }
        ALG_RSASHA512 => {
            let digest = Sha512::digest(&input);
            keypair
                .private_key()
                .sign(Pkcs1v15Sign::new::<Sha512>(), &digest)?
        }
        other => return Err(DnssecError::UnsupportedAlgorithm(other)),
    };

    let rrsig = rdata::RRSIG::new(
        rrsig.type_covered(),
        rrsig.algorithm(),
        rrsig.labels(),
        rrsig.original_ttl(),
        rrsig.expiration(),
        rrsig.inception(),
        rrsig.key_tag(),
        rrsig.signer().clone(),
        signature,
    );

    Ok(ResourceRecord::new(
        owner,
        Class::IN,
        first.ttl(),
        RData::RRSIG(rrsig),
    ))
}

/// Builds the to-be-signed octets for an RRSIG over `rrset`.
///
/// `rrsig` carries the final header fields; its signature field is ignored.
pub fn signature_input(rrsig: &rdata::RRSIG, rrset: &[ResourceRecord]) -> Vec<u8> {
    let mut buf = BytesMut::new();

    // RRSIG RDATA with the signature elided.
    buf.extend_from_slice(&rrsig.type_covered().to_u16().to_be_bytes());
    buf.extend_from_slice(&[rrsig.algorithm(), rrsig.labels()]);
    buf.extend_from_slice(&rrsig.original_ttl().to_be_bytes());
    buf.extend_from_slice(&rrsig.expiration().to_be_bytes());
    buf.extend_from_slice(&rrsig.inception().to_be_bytes());
    buf.extend_from_slice(&rrsig.key_tag().to_be_bytes());
    rrsig.signer().lowercased().write_wire(&mut buf);

    // Canonical RRset, sorted by canonical RDATA.
    let owner = match rrset.first() {
        Some(first) => first.name().lowercased(),
        None => Name::root(),
    };
    let mut rdatas: Vec<Vec<u8>> = rrset
        .iter()
        .map(|rr| {
            let mut rdata = BytesMut::new();
            rr.rdata().write_canonical(&mut rdata);
            rdata.to_vec()
        })
        .collect();
    rdatas.sort();

    for rdata in rdatas {
        owner.write_wire(&mut buf);
        buf.extend_from_slice(&rrsig.type_covered().to_u16().to_be_bytes());
        buf.extend_from_slice(&Class::IN.to_u16().to_be_bytes());
        buf.extend_from_slice(&rrsig.original_ttl().to_be_bytes());
        buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(&rdata);
    }

    buf.to_vec()
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::generate;
    use rsa::{BigUint, RsaPublicKey};

    fn keypair(zone: &str) -> KeyPair {
        let zone: Name = zone.parse().unwrap();
        let generated = generate(&zone, 3600, 1024).unwrap();
        generated.into_keypair().unwrap()
    }

    fn rr(line: &str) -> ResourceRecord {
        line.parse().unwrap()
    }

    #[test]
    fn rrsig_fields_match_the_rrset() {
        let keypair = keypair("example.com.");
        let zone: Name = "example.com.".parse().unwrap();
        let rrset = vec![rr("www.example.com. 300 IN A 1.2.3.4")];
        let now = 1_700_000_000;

        let signed = sign_rrset_at(&rrset, &zone, &keypair, now).unwrap();
        assert_eq!(signed.name().to_string(), "www.example.com.");
        assert_eq!(signed.ttl(), 300);

        let RData::RRSIG(sig) = signed.rdata() else {
            panic!("not an RRSIG");
        };
        assert_eq!(sig.type_covered(), signet_proto::RecordType::A);
        assert_eq!(sig.algorithm(), crate::ALG_RSASHA256);
        assert_eq!(sig.labels(), 3);
        assert_eq!(sig.original_ttl(), 300);
        assert_eq!(sig.inception(), now - 300);
        assert_eq!(sig.expiration(), now + 86_400);
        assert_eq!(sig.key_tag(), keypair.key_tag());
        assert_eq!(sig.signer().to_string(), "example.com.");
        assert!(!sig.signature().is_empty());
    }

    #[test]
    fn signature_verifies_against_published_dnskey() {
        let keypair = keypair("example.com.");
        let zone: Name = "example.com.".parse().unwrap();
        let rrset = vec![
            rr("www.example.com. 300 IN A 1.2.3.4"),
            rr("www.example.com. 300 IN A 5.6.7.8"),
        ];

        let signed = sign_rrset_at(&rrset, &zone, &keypair, 1_700_000_000).unwrap();
        let RData::RRSIG(sig) = signed.rdata() else {
            panic!("not an RRSIG");
        };

        // Rebuild the public key from the DNSKEY's RFC 3110 encoding.
        let public = keypair.dnskey().public_key();
        let exponent_len = public[0] as usize;
        let exponent = BigUint::from_bytes_be(&public[1..1 + exponent_len]);
        let modulus = BigUint::from_bytes_be(&public[1 + exponent_len..]);
        let public = RsaPublicKey::new(modulus, exponent).unwrap();

        let input = signature_input(sig, &rrset);
        let digest = Sha256::digest(&input);
        public
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, sig.signature())
            .expect("signature must verify");
    }

    #[test]
    fn record_order_does_not_change_the_signature_input() {
        let keypair = keypair("example.com.");
        let a = rr("www.example.com. 300 IN A 1.2.3.4");
        let b = rr("www.example.com. 300 IN A 5.6.7.8");

        let rrsig = rdata::RRSIG::new(
            signet_proto::RecordType::A,
            keypair.algorithm(),
            3,
            300,
            1_700_086_400,
            1_699_999_700,
            keypair.key_tag(),
            "example.com.".parse().unwrap(),
            Vec::new(),
        );

        let forward = signature_input(&rrsig, &[a.clone(), b.clone()]);
        let backward = signature_input(&rrsig, &[b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn owner_case_does_not_change_the_signature_input() {
        let rrsig = rdata::RRSIG::new(
            signet_proto::RecordType::A,
            ALG_RSASHA256,
            3,
            300,
            1_700_086_400,
            1_699_999_700,
            1,
            "example.com.".parse().unwrap(),
            Vec::new(),
        );

        let lower = signature_input(&rrsig, &[rr("www.example.com. 300 IN A 1.2.3.4")]);
        let upper = signature_input(&rrsig, &[rr("WWW.EXAMPLE.COM. 300 IN A 1.2.3.4")]);
        assert_eq!(lower, upper);
    }

    #[test]
    fn empty_rrset_is_rejected() {
        let keypair = keypair("example.com.");
        let zone: Name = "example.com.".parse().unwrap();
        let err = sign_rrset_at(&[], &zone, &keypair, 1_700_000_000).unwrap_err();
        assert!(matches!(err, DnssecError::EmptyRrset));
    }
}

//! # Signet DNSSEC
//!
//! Per-zone RSA keypairs and online RRSIG production:
//!
//! - [`KeyStore`] loads `secrets/<zone>/{key.pem,dnskey.txt}` pairs at
//!   startup; zones without a loadable keypair are simply served unsigned.
//! - [`sign_rrset`] produces an RRSIG over one RRset using the RFC 4034
//!   canonical construction.
//! - [`generate`] creates a fresh RSA-2048 keypair with its DNSKEY record
//!   for the offline key generator.

pub mod keygen;
pub mod keystore;
pub mod sign;

pub use keygen::{generate, GeneratedKey};
pub use keystore::{KeyPair, KeyStore};
pub use sign::{sign_rrset, sign_rrset_at};

use thiserror::Error;

/// RSA/SHA-256 (RFC 5702).
pub const ALG_RSASHA256: u8 = 8;

/// RSA/SHA-512 (RFC 5702).
pub const ALG_RSASHA512: u8 = 10;

/// Errors from keystore and signing operations.
#[derive(Debug, Error)]
pub enum DnssecError {
    /// Filesystem access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The private key PEM could not be decoded.
    #[error("private key error: {0}")]
    Pem(#[from] rsa::pkcs1::Error),

    /// The RSA operation failed.
    #[error("rsa error: {0}")]
    Rsa(#[from] rsa::Error),

    /// `dnskey.txt` did not hold a DNSKEY record.
    #[error("not a DNSKEY record: {0}")]
    NotDnskey(String),

    /// The DNSKEY declares an algorithm this signer does not implement.
    #[error("unsupported DNSSEC algorithm {0}")]
    UnsupportedAlgorithm(u8),

    /// An empty RRset cannot be signed.
    #[error("cannot sign an empty RRset")]
    EmptyRrset,
}

/// Result type for DNSSEC operations.
pub type Result<T> = std::result::Result<T, DnssecError>;

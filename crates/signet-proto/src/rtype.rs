//! DNS record types.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// A DNS record type.
///
/// The named variants cover what an authoritative signing server stores and
/// serves; anything else is carried as `Other` so wire data survives intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    /// IPv4 host address.
    A,
    /// Authoritative name server.
    NS,
    /// Canonical name alias.
    CNAME,
    /// Start of authority.
    SOA,
    /// Domain name pointer.
    PTR,
    /// Mail exchange.
    MX,
    /// Text strings.
    TXT,
    /// IPv6 host address.
    AAAA,
    /// EDNS(0) pseudo record.
    OPT,
    /// DNSSEC signature.
    RRSIG,
    /// DNS public key.
    DNSKEY,
    /// Query for all records.
    ANY,
    /// Any other type, by number.
    Other(u16),
}

impl RecordType {
    /// Converts from the wire type code.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::NS,
            5 => Self::CNAME,
            6 => Self::SOA,
            12 => Self::PTR,
            15 => Self::MX,
            16 => Self::TXT,
            28 => Self::AAAA,
            41 => Self::OPT,
            46 => Self::RRSIG,
            48 => Self::DNSKEY,
            255 => Self::ANY,
            other => Self::Other(other),
        }
    }

    /// Converts to the wire type code.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::A => 1,
            Self::NS => 2,
            Self::CNAME => 5,
            Self::SOA => 6,
            Self::PTR => 12,
            Self::MX => 15,
            Self::TXT => 16,
            Self::AAAA => 28,
            Self::OPT => 41,
            Self::RRSIG => 46,
            Self::DNSKEY => 48,
            Self::ANY => 255,
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::NS => write!(f, "NS"),
            Self::CNAME => write!(f, "CNAME"),
            Self::SOA => write!(f, "SOA"),
            Self::PTR => write!(f, "PTR"),
            Self::MX => write!(f, "MX"),
            Self::TXT => write!(f, "TXT"),
            Self::AAAA => write!(f, "AAAA"),
            Self::OPT => write!(f, "OPT"),
            Self::RRSIG => write!(f, "RRSIG"),
            Self::DNSKEY => write!(f, "DNSKEY"),
            Self::ANY => write!(f, "ANY"),
            Self::Other(value) => write!(f, "TYPE{value}"),
        }
    }
}

impl FromStr for RecordType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "A" => Self::A,
            "NS" => Self::NS,
            "CNAME" => Self::CNAME,
            "SOA" => Self::SOA,
            "PTR" => Self::PTR,
            "MX" => Self::MX,
            "TXT" => Self::TXT,
            "AAAA" => Self::AAAA,
            "OPT" => Self::OPT,
            "RRSIG" => Self::RRSIG,
            "DNSKEY" => Self::DNSKEY,
            "ANY" | "*" => Self::ANY,
            _ => {
                let value = upper
                    .strip_prefix("TYPE")
                    .and_then(|n| n.parse::<u16>().ok())
                    .ok_or_else(|| {
                        ProtoError::presentation(format!("unknown record type {s:?}"))
                    })?;
                Self::from_u16(value)
            }
        })
    }
}

//! DNS message header.
//!
//! The fixed 12-byte structure at the start of every message: id, flag word
//! (with embedded opcode and response code) and the four section counts.

use crate::error::{ProtoError, Result};
use bitflags::bitflags;
use std::fmt;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

bitflags! {
    /// DNS header flag bits.
    ///
    /// The opcode and rcode occupy the bits not covered here and are carried
    /// separately in [`Header`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeaderFlags: u16 {
        /// Query/Response: set on responses.
        const QR = 0x8000;
        /// Authoritative Answer.
        const AA = 0x0400;
        /// Truncation.
        const TC = 0x0200;
        /// Recursion Desired.
        const RD = 0x0100;
        /// Recursion Available.
        const RA = 0x0080;
        /// Authentic Data (DNSSEC).
        const AD = 0x0020;
        /// Checking Disabled (DNSSEC).
        const CD = 0x0010;
    }
}

/// DNS operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Standard query.
    Query,
    /// Zone change notification.
    Notify,
    /// Dynamic update.
    Update,
    /// Anything else, by number.
    Other(u8),
}

impl OpCode {
    /// Converts from the 4-bit wire value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Query,
            4 => Self::Notify,
            5 => Self::Update,
            other => Self::Other(other),
        }
    }

    /// Converts to the 4-bit wire value.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Query => 0,
            Self::Notify => 4,
            Self::Update => 5,
            Self::Other(value) => value,
        }
    }
}

/// DNS response codes (the 4-bit header field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rcode {
    /// No error.
    NoError,
    /// Malformed query.
    FormErr,
    /// Server failure.
    ServFail,
    /// Name does not exist.
    NxDomain,
    /// Operation not implemented.
    NotImp,
    /// Query refused.
    Refused,
    /// Anything else, by number.
    Other(u8),
}

impl Rcode {
    /// Converts from the 4-bit wire value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NxDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            other => Self::Other(other),
        }
    }

    /// Converts to the 4-bit wire value.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormErr => 1,
            Self::ServFail => 2,
            Self::NxDomain => 3,
            Self::NotImp => 4,
            Self::Refused => 5,
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoError => write!(f, "NOERROR"),
            Self::FormErr => write!(f, "FORMERR"),
            Self::ServFail => write!(f, "SERVFAIL"),
            Self::NxDomain => write!(f, "NXDOMAIN"),
            Self::NotImp => write!(f, "NOTIMP"),
            Self::Refused => write!(f, "REFUSED"),
            Self::Other(value) => write!(f, "RCODE{value}"),
        }
    }
}

/// DNS message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Message identifier.
    pub id: u16,
    /// Flag bits.
    pub flags: HeaderFlags,
    /// Operation code.
    pub opcode: OpCode,
    /// Response code.
    pub rcode: Rcode,
    /// Question count.
    pub qd_count: u16,
    /// Answer count.
    pub an_count: u16,
    /// Authority count.
    pub ns_count: u16,
    /// Additional count.
    pub ar_count: u16,
}

impl Header {
    /// Creates an empty header with the given id.
    pub const fn new(id: u16) -> Self {
        Self {
            id,
            flags: HeaderFlags::empty(),
            opcode: OpCode::Query,
            rcode: Rcode::NoError,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Creates a response header echoing a query's id, opcode and RD flag.
    pub fn response_from(query: &Header) -> Self {
        Self {
            id: query.id,
            flags: HeaderFlags::QR | (query.flags & HeaderFlags::RD),
            opcode: query.opcode,
            rcode: Rcode::NoError,
            qd_count: query.qd_count,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Returns true if this is a query.
    #[inline]
    pub fn is_query(&self) -> bool {
        !self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the AA bit is set.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.flags.contains(HeaderFlags::AA)
    }

    /// Sets or clears the AA bit.
    pub fn set_authoritative(&mut self, aa: bool) {
        self.flags.set(HeaderFlags::AA, aa);
    }

    /// Parses a header from the start of a message.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(ProtoError::UnexpectedEof {
                offset: HEADER_SIZE,
            });
        }

        let word = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
        let flag_word = word(2);

        Ok(Self {
            id: word(0),
            flags: HeaderFlags::from_bits_truncate(flag_word),
            opcode: OpCode::from_u8(((flag_word >> 11) & 0x0F) as u8),
            rcode: Rcode::from_u8((flag_word & 0x0F) as u8),
            qd_count: word(4),
            an_count: word(6),
            ns_count: word(8),
            ar_count: word(10),
        })
    }

    /// Writes the header in wire format.
    pub fn write_to(&self, buf: &mut bytes::BytesMut) {
        let flag_word = self.flags.bits()
            | (u16::from(self.opcode.to_u8() & 0x0F) << 11)
            | u16::from(self.rcode.to_u8() & 0x0F);

        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&flag_word.to_be_bytes());
        buf.extend_from_slice(&self.qd_count.to_be_bytes());
        buf.extend_from_slice(&self.an_count.to_be_bytes());
        buf.extend_from_slice(&self.ns_count.to_be_bytes());
        buf.extend_from_slice(&self.ar_count.to_be_bytes());
    }
}

//! # Signet DNS Protocol Library
//!
//! Compact DNS protocol support for an authoritative server:
//!
//! - Domain names with case-insensitive semantics and compression-pointer
//!   parsing (RFC 1035)
//! - The record types an authoritative, online-signing server serves:
//!   A, AAAA, NS, CNAME, MX, SOA, TXT, DNSKEY, RRSIG
//! - Wire-format message encoding and decoding
//! - Presentation-format (zone-file line) parsing and display, which is the
//!   interchange format of the record store and the replication protocol

pub mod class;
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod question;
pub mod rdata;
pub mod record;
pub mod rtype;

pub use class::Class;
pub use error::{ProtoError, Result};
pub use header::{Header, HeaderFlags, OpCode, Rcode, HEADER_SIZE};
pub use message::Message;
pub use name::{Name, NameParser};
pub use question::Question;
pub use rdata::RData;
pub use record::ResourceRecord;
pub use rtype::RecordType;

/// Maximum length of a single label in octets.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a name in wire format, including length octets and root.
pub const MAX_NAME_LENGTH: usize = 255;

//! DNS record data (RDATA) types.
//!
//! Each type supports four codecs: wire parse, wire write, canonical wire
//! write (RFC 4034 section 6.2 — embedded names lowercased, used when
//! building signature input), and presentation format (parse from the
//! whitespace-split fields of a zone-file line, display back to it).

use crate::error::{ProtoError, Result};
use crate::name::{Name, NameParser};
use crate::rtype::RecordType;
use bytes::BytesMut;
use data_encoding::{BASE64, HEXUPPER};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Parsed record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum RData {
    /// IPv4 address.
    A(A),
    /// IPv6 address.
    AAAA(AAAA),
    /// Name server.
    NS(NS),
    /// Canonical name.
    CNAME(CNAME),
    /// Mail exchange.
    MX(MX),
    /// Start of authority.
    SOA(SOA),
    /// Text strings.
    TXT(TXT),
    /// DNS public key.
    DNSKEY(DNSKEY),
    /// DNSSEC signature.
    RRSIG(RRSIG),
    /// Opaque data for types without a dedicated decoder.
    Unknown(Unknown),
}

impl RData {
    /// Parses RDATA from wire format.
    ///
    /// `message` is the complete message buffer so that embedded names can
    /// follow compression pointers.
    pub fn parse(rtype: RecordType, message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        let slice = message
            .get(offset..offset + rdlength as usize)
            .ok_or(ProtoError::UnexpectedEof {
                offset: offset + rdlength as usize,
            })?;

        Ok(match rtype {
            RecordType::A => Self::A(A::parse(slice)?),
            RecordType::AAAA => Self::AAAA(AAAA::parse(slice)?),
            RecordType::NS => Self::NS(NS::parse(message, offset)?),
            RecordType::CNAME => Self::CNAME(CNAME::parse(message, offset)?),
            RecordType::MX => Self::MX(MX::parse(message, offset)?),
            RecordType::SOA => Self::SOA(SOA::parse(message, offset)?),
            RecordType::TXT => Self::TXT(TXT::parse(slice)?),
            RecordType::DNSKEY => Self::DNSKEY(DNSKEY::parse(slice)?),
            RecordType::RRSIG => Self::RRSIG(RRSIG::parse(message, offset, rdlength)?),
            other => Self::Unknown(Unknown::new(other.to_u16(), slice)),
        })
    }

    /// Parses RDATA from the fields of a presentation-format line.
    ///
    /// `fields` are the tokens following the type mnemonic; quoted strings
    /// arrive as single unquoted tokens.
    pub fn from_presentation(rtype: RecordType, fields: &[String]) -> Result<Self> {
        Ok(match rtype {
            RecordType::A => Self::A(A::from_fields(fields)?),
            RecordType::AAAA => Self::AAAA(AAAA::from_fields(fields)?),
            RecordType::NS => Self::NS(NS::from_fields(fields)?),
            RecordType::CNAME => Self::CNAME(CNAME::from_fields(fields)?),
            RecordType::MX => Self::MX(MX::from_fields(fields)?),
            RecordType::SOA => Self::SOA(SOA::from_fields(fields)?),
            RecordType::TXT => Self::TXT(TXT::from_fields(fields)?),
            RecordType::DNSKEY => Self::DNSKEY(DNSKEY::from_fields(fields)?),
            RecordType::RRSIG => Self::RRSIG(RRSIG::from_fields(fields)?),
            other => return Err(ProtoError::UnsupportedType(other.to_string())),
        })
    }

    /// Returns the record type this data belongs to.
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A(_) => RecordType::A,
            Self::AAAA(_) => RecordType::AAAA,
            Self::NS(_) => RecordType::NS,
            Self::CNAME(_) => RecordType::CNAME,
            Self::MX(_) => RecordType::MX,
            Self::SOA(_) => RecordType::SOA,
            Self::TXT(_) => RecordType::TXT,
            Self::DNSKEY(_) => RecordType::DNSKEY,
            Self::RRSIG(_) => RecordType::RRSIG,
            Self::Unknown(u) => RecordType::from_u16(u.rtype),
        }
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        match self {
            Self::A(_) => 4,
            Self::AAAA(_) => 16,
            Self::NS(r) => r.nsdname.wire_len(),
            Self::CNAME(r) => r.target.wire_len(),
            Self::MX(r) => 2 + r.exchange.wire_len(),
            Self::SOA(r) => r.mname.wire_len() + r.rname.wire_len() + 20,
            Self::TXT(r) => r.strings.iter().map(|s| 1 + s.len()).sum(),
            Self::DNSKEY(r) => 4 + r.public_key.len(),
            Self::RRSIG(r) => 18 + r.signer.wire_len() + r.signature.len(),
            Self::Unknown(r) => r.data.len(),
        }
    }

    /// Writes the RDATA in wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.write_impl(buf, false);
    }

    /// Writes the RDATA in canonical form for signing: embedded names are
    /// lowercased, everything else matches the wire format.
    pub fn write_canonical(&self, buf: &mut BytesMut) {
        self.write_impl(buf, true);
    }

    fn write_impl(&self, buf: &mut BytesMut, canonical: bool) {
        let name = |n: &Name, buf: &mut BytesMut| {
            if canonical {
                n.lowercased().write_wire(buf);
            } else {
                n.write_wire(buf);
            }
        };

        match self {
            Self::A(r) => buf.extend_from_slice(&r.address.octets()),
            Self::AAAA(r) => buf.extend_from_slice(&r.address.octets()),
            Self::NS(r) => name(&r.nsdname, buf),
            Self::CNAME(r) => name(&r.target, buf),
            Self::MX(r) => {
                buf.extend_from_slice(&r.preference.to_be_bytes());
                name(&r.exchange, buf);
            }
            Self::SOA(r) => {
                name(&r.mname, buf);
                name(&r.rname, buf);
                buf.extend_from_slice(&r.serial.to_be_bytes());
                buf.extend_from_slice(&r.refresh.to_be_bytes());
                buf.extend_from_slice(&r.retry.to_be_bytes());
                buf.extend_from_slice(&r.expire.to_be_bytes());
                buf.extend_from_slice(&r.minimum.to_be_bytes());
            }
            Self::TXT(r) => {
                for s in &r.strings {
                    buf.extend_from_slice(&[s.len() as u8]);
                    buf.extend_from_slice(s.as_bytes());
                }
            }
            Self::DNSKEY(r) => {
                buf.extend_from_slice(&r.flags.to_be_bytes());
                buf.extend_from_slice(&[r.protocol, r.algorithm]);
                buf.extend_from_slice(&r.public_key);
            }
            Self::RRSIG(r) => {
                buf.extend_from_slice(&r.type_covered.to_u16().to_be_bytes());
                buf.extend_from_slice(&[r.algorithm, r.labels]);
                buf.extend_from_slice(&r.original_ttl.to_be_bytes());
                buf.extend_from_slice(&r.expiration.to_be_bytes());
                buf.extend_from_slice(&r.inception.to_be_bytes());
                buf.extend_from_slice(&r.key_tag.to_be_bytes());
                name(&r.signer, buf);
                buf.extend_from_slice(&r.signature);
            }
            Self::Unknown(r) => buf.extend_from_slice(&r.data),
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(r) => write!(f, "{r}"),
            Self::AAAA(r) => write!(f, "{r}"),
            Self::NS(r) => write!(f, "{r}"),
            Self::CNAME(r) => write!(f, "{r}"),
            Self::MX(r) => write!(f, "{r}"),
            Self::SOA(r) => write!(f, "{r}"),
            Self::TXT(r) => write!(f, "{r}"),
            Self::DNSKEY(r) => write!(f, "{r}"),
            Self::RRSIG(r) => write!(f, "{r}"),
            Self::Unknown(r) => write!(f, "{r}"),
        }
    }
}

fn field<'a>(fields: &'a [String], idx: usize, what: &str) -> Result<&'a str> {
    fields
        .get(idx)
        .map(String::as_str)
        .ok_or_else(|| ProtoError::presentation(format!("missing {what} field")))
}

fn parse_field<T: FromStr>(fields: &[String], idx: usize, what: &str) -> Result<T> {
    field(fields, idx, what)?
        .parse()
        .map_err(|_| ProtoError::presentation(format!("bad {what} field")))
}

/// Decodes base64 that may be split across several whitespace tokens.
fn base64_fields(fields: &[String], from: usize, what: &str) -> Result<Vec<u8>> {
    if fields.len() <= from {
        return Err(ProtoError::presentation(format!("missing {what} field")));
    }
    let joined: String = fields[from..].concat();
    BASE64
        .decode(joined.as_bytes())
        .map_err(|_| ProtoError::presentation(format!("bad base64 in {what}")))
}

// ---------------------------------------------------------------------------
// Address records
// ---------------------------------------------------------------------------

/// A record — IPv4 host address (RFC 1035).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A {
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    pub fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the address.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    fn parse(data: &[u8]) -> Result<Self> {
        let octets: [u8; 4] = data
            .try_into()
            .map_err(|_| ProtoError::invalid_rdata("A", "expected 4 octets"))?;
        Ok(Self {
            address: Ipv4Addr::from(octets),
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            address: parse_field(fields, 0, "address")?,
        })
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// AAAA record — IPv6 host address (RFC 3596).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AAAA {
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    pub fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the address.
    pub fn address(&self) -> Ipv6Addr {
        self.address
    }

    fn parse(data: &[u8]) -> Result<Self> {
        let octets: [u8; 16] = data
            .try_into()
            .map_err(|_| ProtoError::invalid_rdata("AAAA", "expected 16 octets"))?;
        Ok(Self {
            address: Ipv6Addr::from(octets),
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            address: parse_field(fields, 0, "address")?,
        })
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

// ---------------------------------------------------------------------------
// Name records
// ---------------------------------------------------------------------------

/// NS record — authoritative name server (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NS {
    nsdname: Name,
}

impl NS {
    /// Creates a new NS record.
    pub fn new(nsdname: Name) -> Self {
        Self { nsdname }
    }

    /// Returns the name server name.
    pub fn nsdname(&self) -> &Name {
        &self.nsdname
    }

    fn parse(message: &[u8], offset: usize) -> Result<Self> {
        let (nsdname, _) = NameParser::new(message).parse_name(offset)?;
        Ok(Self { nsdname })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            nsdname: parse_field(fields, 0, "nsdname")?,
        })
    }
}

impl fmt::Display for NS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nsdname)
    }
}

/// CNAME record — canonical name alias (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CNAME {
    target: Name,
}

impl CNAME {
    /// Creates a new CNAME record.
    pub fn new(target: Name) -> Self {
        Self { target }
    }

    /// Returns the alias target.
    pub fn target(&self) -> &Name {
        &self.target
    }

    fn parse(message: &[u8], offset: usize) -> Result<Self> {
        let (target, _) = NameParser::new(message).parse_name(offset)?;
        Ok(Self { target })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            target: parse_field(fields, 0, "target")?,
        })
    }
}

impl fmt::Display for CNAME {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)
    }
}

/// MX record — mail exchange (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MX {
    preference: u16,
    exchange: Name,
}

impl MX {
    /// Creates a new MX record.
    pub fn new(preference: u16, exchange: Name) -> Self {
        Self {
            preference,
            exchange,
        }
    }

    /// Returns the preference value.
    pub fn preference(&self) -> u16 {
        self.preference
    }

    /// Returns the exchange name.
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    fn parse(message: &[u8], offset: usize) -> Result<Self> {
        let pref = message
            .get(offset..offset + 2)
            .ok_or(ProtoError::UnexpectedEof { offset: offset + 2 })?;
        let preference = u16::from_be_bytes([pref[0], pref[1]]);
        let (exchange, _) = NameParser::new(message).parse_name(offset + 2)?;
        Ok(Self {
            preference,
            exchange,
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            preference: parse_field(fields, 0, "preference")?,
            exchange: parse_field(fields, 1, "exchange")?,
        })
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

/// SOA record — start of authority (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SOA {
    mname: Name,
    rname: Name,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    minimum: u32,
}

impl SOA {
    /// Creates a new SOA record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> Self {
        Self {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// Returns the primary name server.
    pub fn mname(&self) -> &Name {
        &self.mname
    }

    /// Returns the serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the negative-caching minimum TTL.
    pub fn minimum(&self) -> u32 {
        self.minimum
    }

    fn parse(message: &[u8], offset: usize) -> Result<Self> {
        let parser = NameParser::new(message);
        let (mname, n1) = parser.parse_name(offset)?;
        let (rname, n2) = parser.parse_name(offset + n1)?;
        let fixed = offset + n1 + n2;
        let data = message
            .get(fixed..fixed + 20)
            .ok_or(ProtoError::UnexpectedEof { offset: fixed + 20 })?;
        let word = |i: usize| u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        Ok(Self {
            mname,
            rname,
            serial: word(0),
            refresh: word(4),
            retry: word(8),
            expire: word(12),
            minimum: word(16),
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            mname: parse_field(fields, 0, "mname")?,
            rname: parse_field(fields, 1, "rname")?,
            serial: parse_field(fields, 2, "serial")?,
            refresh: parse_field(fields, 3, "refresh")?,
            retry: parse_field(fields, 4, "retry")?,
            expire: parse_field(fields, 5, "expire")?,
            minimum: parse_field(fields, 6, "minimum")?,
        })
    }
}

impl fmt::Display for SOA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname, self.rname, self.serial, self.refresh, self.retry, self.expire, self.minimum
        )
    }
}

// ---------------------------------------------------------------------------
// Text records
// ---------------------------------------------------------------------------

/// TXT record — free-form text strings (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TXT {
    strings: Vec<String>,
}

impl TXT {
    /// Creates a TXT record from its character strings.
    pub fn new(strings: Vec<String>) -> Self {
        Self { strings }
    }

    /// Returns the character strings.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    fn parse(data: &[u8]) -> Result<Self> {
        let mut strings = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let len = data[pos] as usize;
            let chunk = data
                .get(pos + 1..pos + 1 + len)
                .ok_or_else(|| ProtoError::invalid_rdata("TXT", "truncated string"))?;
            strings.push(String::from_utf8_lossy(chunk).into_owned());
            pos += 1 + len;
        }
        Ok(Self { strings })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        if fields.is_empty() {
            return Err(ProtoError::invalid_rdata("TXT", "no strings"));
        }
        Ok(Self {
            strings: fields.to_vec(),
        })
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.strings.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "\"{s}\"")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DNSSEC records
// ---------------------------------------------------------------------------

/// DNSKEY record — DNS public key (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DNSKEY {
    flags: u16,
    protocol: u8,
    algorithm: u8,
    public_key: Vec<u8>,
}

impl DNSKEY {
    /// Zone Key flag bit.
    pub const FLAG_ZONE_KEY: u16 = 0x0100;

    /// Creates a new DNSKEY record.
    pub fn new(flags: u16, protocol: u8, algorithm: u8, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            flags,
            protocol,
            algorithm,
            public_key: public_key.into(),
        }
    }

    /// Returns the flags field.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the protocol field (3 for DNSSEC).
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Returns the algorithm number.
    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the public key bytes.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Calculates the key tag (RFC 4034 Appendix B).
    pub fn key_tag(&self) -> u16 {
        let mut buf = BytesMut::with_capacity(4 + self.public_key.len());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&[self.protocol, self.algorithm]);
        buf.extend_from_slice(&self.public_key);

        let mut ac: u32 = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if i & 1 == 0 {
                ac += u32::from(byte) << 8;
            } else {
                ac += u32::from(byte);
            }
        }
        ac += ac >> 16;
        (ac & 0xFFFF) as u16
    }

    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(ProtoError::invalid_rdata("DNSKEY", "too short"));
        }
        Ok(Self {
            flags: u16::from_be_bytes([data[0], data[1]]),
            protocol: data[2],
            algorithm: data[3],
            public_key: data[4..].to_vec(),
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            flags: parse_field(fields, 0, "flags")?,
            protocol: parse_field(fields, 1, "protocol")?,
            algorithm: parse_field(fields, 2, "algorithm")?,
            public_key: base64_fields(fields, 3, "public key")?,
        })
    }
}

impl fmt::Display for DNSKEY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.flags,
            self.protocol,
            self.algorithm,
            BASE64.encode(&self.public_key)
        )
    }
}

/// RRSIG record — DNSSEC signature over one RRset (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RRSIG {
    type_covered: RecordType,
    algorithm: u8,
    labels: u8,
    original_ttl: u32,
    expiration: u32,
    inception: u32,
    key_tag: u16,
    signer: Name,
    signature: Vec<u8>,
}

impl RRSIG {
    /// Creates a new RRSIG record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: RecordType,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: Name,
        signature: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature: signature.into(),
        }
    }

    /// Returns the covered record type.
    pub fn type_covered(&self) -> RecordType {
        self.type_covered
    }

    /// Returns the algorithm number.
    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the owner label count.
    pub fn labels(&self) -> u8 {
        self.labels
    }

    /// Returns the original TTL.
    pub fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Returns the expiration time as Unix seconds.
    pub fn expiration(&self) -> u32 {
        self.expiration
    }

    /// Returns the inception time as Unix seconds.
    pub fn inception(&self) -> u32 {
        self.inception
    }

    /// Returns the key tag of the signing key.
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the signer name.
    pub fn signer(&self) -> &Name {
        &self.signer
    }

    /// Returns the signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    fn parse(message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        let fixed = message
            .get(offset..offset + 18)
            .ok_or(ProtoError::UnexpectedEof {
                offset: offset + 18,
            })?;
        let type_covered = RecordType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]]));
        let algorithm = fixed[2];
        let labels = fixed[3];
        let word = |i: usize| u32::from_be_bytes([fixed[i], fixed[i + 1], fixed[i + 2], fixed[i + 3]]);
        let original_ttl = word(4);
        let expiration = word(8);
        let inception = word(12);
        let key_tag = u16::from_be_bytes([fixed[16], fixed[17]]);

        let (signer, name_len) = NameParser::new(message).parse_name(offset + 18)?;
        let sig_start = offset + 18 + name_len;
        let sig_end = offset + rdlength as usize;
        let signature = message
            .get(sig_start..sig_end)
            .ok_or(ProtoError::UnexpectedEof { offset: sig_end })?
            .to_vec();

        Ok(Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature,
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            type_covered: parse_field(fields, 0, "type covered")?,
            algorithm: parse_field(fields, 1, "algorithm")?,
            labels: parse_field(fields, 2, "labels")?,
            original_ttl: parse_field(fields, 3, "original ttl")?,
            expiration: parse_timestamp(field(fields, 4, "expiration")?)?,
            inception: parse_timestamp(field(fields, 5, "inception")?)?,
            key_tag: parse_field(fields, 6, "key tag")?,
            signer: parse_field(fields, 7, "signer")?,
            signature: base64_fields(fields, 8, "signature")?,
        })
    }
}

impl fmt::Display for RRSIG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {}",
            self.type_covered,
            self.algorithm,
            self.labels,
            self.original_ttl,
            format_timestamp(self.expiration),
            format_timestamp(self.inception),
            self.key_tag,
            self.signer,
            BASE64.encode(&self.signature)
        )
    }
}

/// Formats an RRSIG timestamp as `YYYYMMDDHHMMSS` (RFC 4034 section 3.2).
fn format_timestamp(ts: u32) -> String {
    match chrono::DateTime::from_timestamp(i64::from(ts), 0) {
        Some(dt) => dt.format("%Y%m%d%H%M%S").to_string(),
        None => ts.to_string(),
    }
}

/// Parses an RRSIG timestamp from `YYYYMMDDHHMMSS` or raw seconds.
fn parse_timestamp(s: &str) -> Result<u32> {
    if s.len() == 14 && s.bytes().all(|b| b.is_ascii_digit()) {
        let dt = chrono::NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S")
            .map_err(|_| ProtoError::presentation(format!("bad timestamp {s:?}")))?;
        return Ok(dt.and_utc().timestamp() as u32);
    }
    s.parse()
        .map_err(|_| ProtoError::presentation(format!("bad timestamp {s:?}")))
}

// ---------------------------------------------------------------------------
// Unknown data
// ---------------------------------------------------------------------------

/// Opaque RDATA for record types without a dedicated decoder.
///
/// Displayed in the RFC 3597 `\# <len> <hex>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unknown {
    rtype: u16,
    data: Vec<u8>,
}

impl Unknown {
    /// Creates opaque RDATA from raw bytes.
    pub fn new(rtype: u16, data: &[u8]) -> Self {
        Self {
            rtype,
            data: data.to_vec(),
        }
    }

    /// Returns the type code this data was read for.
    pub fn type_code(&self) -> u16 {
        self.rtype
    }

    /// Returns the raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\# {} {}", self.data.len(), HEXUPPER.encode(&self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn a_presentation_roundtrip() {
        let rdata = RData::from_presentation(RecordType::A, &fields(&["1.2.3.4"])).unwrap();
        assert_eq!(rdata.to_string(), "1.2.3.4");
        assert_eq!(rdata.wire_len(), 4);
    }

    #[test]
    fn aaaa_presentation_roundtrip() {
        let rdata = RData::from_presentation(RecordType::AAAA, &fields(&["2001:db8::1"])).unwrap();
        assert_eq!(rdata.to_string(), "2001:db8::1");
    }

    #[test]
    fn mx_presentation_roundtrip() {
        let rdata =
            RData::from_presentation(RecordType::MX, &fields(&["10", "mail.example.com."])).unwrap();
        assert_eq!(rdata.to_string(), "10 mail.example.com.");
    }

    #[test]
    fn txt_quoting() {
        let rdata = RData::from_presentation(RecordType::TXT, &fields(&["hello world", "x"])).unwrap();
        assert_eq!(rdata.to_string(), "\"hello world\" \"x\"");
    }

    #[test]
    fn dnskey_roundtrip_and_key_tag() {
        let key = DNSKEY::new(256, 3, 8, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let shown = key.to_string();
        let parsed = DNSKEY::from_fields(&fields(&shown.split(' ').collect::<Vec<_>>())).unwrap();
        assert_eq!(parsed, key);

        // Key tag is stable and derived from the full RDATA.
        assert_eq!(key.key_tag(), parsed.key_tag());
        let other = DNSKEY::new(256, 3, 8, vec![1, 2, 3, 4, 5, 6, 7, 9]);
        assert_ne!(key.key_tag(), other.key_tag());
    }

    #[test]
    fn rrsig_presentation_roundtrip() {
        let sig = RRSIG::new(
            RecordType::A,
            8,
            3,
            300,
            1_700_086_400,
            1_700_000_000,
            12345,
            "example.com.".parse().unwrap(),
            vec![0xAA; 16],
        );
        let shown = sig.to_string();
        let parsed =
            RRSIG::from_fields(&fields(&shown.split(' ').collect::<Vec<_>>())).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn rrsig_timestamp_forms() {
        assert_eq!(parse_timestamp("1700000000").unwrap(), 1_700_000_000);
        let formatted = format_timestamp(1_700_000_000);
        assert_eq!(formatted.len(), 14);
        assert_eq!(parse_timestamp(&formatted).unwrap(), 1_700_000_000);
    }

    #[test]
    fn wire_roundtrip_with_names() {
        let rdata = RData::MX(MX::new(5, "mx.example.org.".parse().unwrap()));
        let mut buf = BytesMut::new();
        rdata.write_to(&mut buf);
        let parsed = RData::parse(RecordType::MX, &buf, 0, buf.len() as u16).unwrap();
        assert_eq!(parsed, rdata);
    }

    #[test]
    fn canonical_lowercases_names() {
        let rdata = RData::CNAME(CNAME::new("WWW.Example.COM.".parse().unwrap()));
        let mut wire = BytesMut::new();
        let mut canonical = BytesMut::new();
        rdata.write_to(&mut wire);
        rdata.write_canonical(&mut canonical);
        assert_ne!(wire, canonical);
        let canonical = canonical.to_vec();
        assert_eq!(canonical.to_ascii_lowercase(), canonical);
    }

    #[test]
    fn unknown_type_has_no_presentation_parser() {
        let err = RData::from_presentation(RecordType::Other(9999), &fields(&["x"]));
        assert!(matches!(err, Err(ProtoError::UnsupportedType(_))));
    }
}

//! DNS resource records.
//!
//! Besides the usual wire codec, `ResourceRecord` round-trips through the
//! one-line presentation format `"{name} {ttl} IN {type} {data}"`. That text
//! form is the lingua franca of this system: the record store persists rdata
//! in it, the replication envelope ships complete lines of it, and the
//! keystore reads `dnskey.txt` files written in it.

use crate::class::Class;
use crate::error::{ProtoError, Result};
use crate::name::{Name, NameParser};
use crate::rdata::RData;
use crate::rtype::RecordType;
use bytes::BytesMut;
use std::fmt;
use std::str::FromStr;

/// A DNS resource record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRecord {
    name: Name,
    rtype: RecordType,
    class: Class,
    ttl: u32,
    rdata: RData,
}

impl ResourceRecord {
    /// Creates a new resource record.
    pub fn new(name: Name, class: Class, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            rtype: rdata.record_type(),
            class,
            ttl,
            rdata,
        }
    }

    /// Creates an A record.
    pub fn a(name: Name, ttl: u32, addr: std::net::Ipv4Addr) -> Self {
        Self::new(name, Class::IN, ttl, RData::A(crate::rdata::A::new(addr)))
    }

    /// Returns the owner name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type.
    #[inline]
    pub fn rtype(&self) -> RecordType {
        self.rtype
    }

    /// Returns the class.
    #[inline]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the TTL in seconds.
    #[inline]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the record data.
    #[inline]
    pub fn rdata(&self) -> &RData {
        &self.rdata
    }

    /// Returns a copy with the owner name lowercased.
    #[must_use]
    pub fn with_lowercase_name(&self) -> Self {
        let mut copy = self.clone();
        copy.name.make_lowercase();
        copy
    }

    /// Parses a record from wire format.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn parse(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (name, name_len) = NameParser::new(message).parse_name(offset)?;

        let fixed_start = offset + name_len;
        let fixed = message
            .get(fixed_start..fixed_start + 10)
            .ok_or(ProtoError::UnexpectedEof {
                offset: fixed_start + 10,
            })?;

        let rtype = RecordType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]]));
        let class = Class::from_u16(u16::from_be_bytes([fixed[2], fixed[3]]));
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength = u16::from_be_bytes([fixed[8], fixed[9]]);

        let rdata = RData::parse(rtype, message, fixed_start + 10, rdlength)?;

        Ok((
            Self {
                name,
                rtype,
                class,
                ttl,
                rdata,
            },
            name_len + 10 + rdlength as usize,
        ))
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.rdata.wire_len()
    }

    /// Writes the record to wire format (uncompressed).
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.name.write_wire(buf);
        buf.extend_from_slice(&self.rtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.class.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.rdata.wire_len() as u16).to_be_bytes());
        self.rdata.write_to(buf);
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.name, self.ttl, self.class, self.rtype, self.rdata
        )
    }
}

impl FromStr for ResourceRecord {
    type Err = ProtoError;

    /// Parses one presentation-format line.
    ///
    /// The TTL and class tokens may be omitted (defaulting to 3600 and IN)
    /// and may appear in either order, matching common zone-file laxity.
    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        if tokens.is_empty() {
            return Err(ProtoError::presentation("empty record line"));
        }

        let name: Name = tokens[0].parse()?;
        let mut idx = 1;
        let mut ttl = 3600u32;
        let mut class = Class::IN;

        // Up to two leading tokens of TTL and/or class, in any order. A token
        // that also names a record type (e.g. ANY) is left for the type slot.
        for _ in 0..2 {
            let Some(tok) = tokens.get(idx) else { break };
            if let Ok(parsed) = tok.parse::<u32>() {
                ttl = parsed;
                idx += 1;
            } else if tok.parse::<RecordType>().is_err() {
                let Ok(parsed) = tok.parse::<Class>() else { break };
                class = parsed;
                idx += 1;
            } else {
                break;
            }
        }

        let rtype: RecordType = tokens
            .get(idx)
            .ok_or_else(|| ProtoError::presentation("missing record type"))?
            .parse()?;
        let rdata = RData::from_presentation(rtype, &tokens[idx + 1..])?;

        Ok(Self {
            name,
            rtype,
            class,
            ttl,
            rdata,
        })
    }
}

/// Splits a presentation line into fields, honoring double quotes.
///
/// A quoted segment becomes a single token without its quotes, so TXT data
/// like `"a b" "c"` yields the two strings `a b` and `c`.
fn tokenize(s: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut had_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                had_quotes = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || had_quotes {
                    tokens.push(std::mem::take(&mut current));
                    had_quotes = false;
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(ProtoError::presentation("unterminated quoted string"));
    }
    if !current.is_empty() || had_quotes {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parser for a run of records within a message.
#[derive(Debug)]
pub struct RecordParser<'a> {
    message: &'a [u8],
    offset: usize,
    remaining: u16,
}

impl<'a> RecordParser<'a> {
    /// Creates a parser for `count` records starting at `offset`.
    #[inline]
    pub const fn new(message: &'a [u8], offset: usize, count: u16) -> Self {
        Self {
            message,
            offset,
            remaining: count,
        }
    }

    /// Returns the offset past the last parsed record.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Parses the next record, or `None` when the run is exhausted.
    pub fn next(&mut self) -> Result<Option<ResourceRecord>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let (record, consumed) = ResourceRecord::parse(self.message, self.offset)?;
        self.offset += consumed;
        self.remaining -= 1;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn presentation_roundtrip() {
        let line = "www.example.com. 300 IN A 1.2.3.4";
        let rr: ResourceRecord = line.parse().unwrap();
        assert_eq!(rr.name().to_string(), "www.example.com.");
        assert_eq!(rr.ttl(), 300);
        assert_eq!(rr.rtype(), RecordType::A);
        assert_eq!(rr.to_string(), line);
    }

    #[test]
    fn presentation_defaults() {
        let rr: ResourceRecord = "example.com. A 1.2.3.4".parse().unwrap();
        assert_eq!(rr.ttl(), 3600);
        assert_eq!(rr.class(), Class::IN);

        // Class before TTL is also accepted.
        let rr: ResourceRecord = "example.com. IN 60 A 1.2.3.4".parse().unwrap();
        assert_eq!(rr.ttl(), 60);
    }

    #[test]
    fn presentation_txt_with_quotes() {
        let rr: ResourceRecord = "example.com. 60 IN TXT \"hello world\" \"v=1\"".parse().unwrap();
        if let RData::TXT(txt) = rr.rdata() {
            assert_eq!(txt.strings(), ["hello world".to_string(), "v=1".to_string()]);
        } else {
            panic!("not TXT");
        }
        assert_eq!(rr.to_string(), "example.com. 60 IN TXT \"hello world\" \"v=1\"");
    }

    #[test]
    fn presentation_txt_bare_tokens() {
        // Unquoted tokens each become one string, as in the stored form.
        let rr: ResourceRecord = "example.com. 60 IN TXT foo bar".parse().unwrap();
        if let RData::TXT(txt) = rr.rdata() {
            assert_eq!(txt.strings(), ["foo".to_string(), "bar".to_string()]);
        } else {
            panic!("not TXT");
        }
    }

    #[test]
    fn presentation_bad_lines() {
        assert!("".parse::<ResourceRecord>().is_err());
        assert!("example.com. 60 IN".parse::<ResourceRecord>().is_err());
        assert!("example.com. 60 IN A not-an-ip".parse::<ResourceRecord>().is_err());
        assert!("example.com. 60 IN TXT \"open".parse::<ResourceRecord>().is_err());
    }

    #[test]
    fn wire_roundtrip() {
        let rr = ResourceRecord::a(
            "www.example.com.".parse().unwrap(),
            3600,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        let mut buf = BytesMut::new();
        rr.write_to(&mut buf);
        let (parsed, consumed) = ResourceRecord::parse(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(parsed, rr);
    }

    #[test]
    fn rrsig_line_roundtrip() {
        let line = "www.example.com. 300 IN RRSIG A 8 3 300 20260801000000 20260731000000 31589 example.com. qqqqqqqqqqqqqqqqqqqqqg==";
        let rr: ResourceRecord = line.parse().unwrap();
        assert_eq!(rr.rtype(), RecordType::RRSIG);
        if let RData::RRSIG(sig) = rr.rdata() {
            assert_eq!(sig.type_covered(), RecordType::A);
            assert_eq!(sig.signer().to_string(), "example.com.");
        } else {
            panic!("not RRSIG");
        }
        assert_eq!(rr.to_string(), line);
    }
}

//! DNS question section.

use crate::class::Class;
use crate::error::Result;
use crate::name::{Name, NameParser};
use crate::rtype::RecordType;
use bytes::BytesMut;
use std::fmt;

/// A DNS question: what name and type are being asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    /// The name being queried.
    pub qname: Name,
    /// The record type requested.
    pub qtype: RecordType,
    /// The class, in practice always IN.
    pub qclass: Class,
}

impl Question {
    /// Creates a new question.
    pub fn new(qname: Name, qtype: RecordType) -> Self {
        Self {
            qname,
            qtype,
            qclass: Class::IN,
        }
    }

    /// Parses a question, returning it and the bytes consumed.
    pub fn parse(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (qname, name_len) = NameParser::new(message).parse_name(offset)?;
        let fixed = message
            .get(offset + name_len..offset + name_len + 4)
            .ok_or(crate::error::ProtoError::UnexpectedEof {
                offset: offset + name_len + 4,
            })?;
        Ok((
            Self {
                qname,
                qtype: RecordType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]])),
                qclass: Class::from_u16(u16::from_be_bytes([fixed[2], fixed[3]])),
            },
            name_len + 4,
        ))
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        self.qname.wire_len() + 4
    }

    /// Writes the question in wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.qname.write_wire(buf);
        buf.extend_from_slice(&self.qtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_u16().to_be_bytes());
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let q = Question::new("www.example.com.".parse().unwrap(), RecordType::AAAA);
        let mut buf = BytesMut::new();
        q.write_to(&mut buf);

        let (parsed, consumed) = Question::parse(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(parsed, q);
    }
}

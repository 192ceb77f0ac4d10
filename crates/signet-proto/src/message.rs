//! DNS message representation.
//!
//! A message is the fixed header, the question section, and the answer,
//! authority and additional record sections. OPT pseudo-records met while
//! parsing are dropped: this server takes no EDNS-specific action, and
//! responses are written without one.

use crate::error::{ProtoError, Result};
use crate::header::{Header, HeaderFlags, Rcode, HEADER_SIZE};
use crate::question::Question;
use crate::record::{RecordParser, ResourceRecord};
use crate::rtype::RecordType;
use bytes::{Bytes, BytesMut};

/// A complete DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authority: Vec<ResourceRecord>,
    additional: Vec<ResourceRecord>,
}

impl Message {
    /// Creates an empty message with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Creates a query message for one question.
    pub fn query(id: u16, question: Question) -> Self {
        let mut header = Header::new(id);
        header.qd_count = 1;
        Self {
            header,
            questions: vec![question],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Creates a response skeleton from a query: same id and opcode, QR set,
    /// questions echoed.
    pub fn response_from(query: &Message) -> Self {
        Self {
            header: Header::response_from(&query.header),
            questions: query.questions.clone(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Returns the header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the message id.
    #[inline]
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Returns the response code.
    #[inline]
    pub fn rcode(&self) -> Rcode {
        self.header.rcode
    }

    /// Sets the response code.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.header.rcode = rcode;
    }

    /// Returns true if the AA bit is set.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.header.is_authoritative()
    }

    /// Sets or clears the AA bit.
    pub fn set_authoritative(&mut self, aa: bool) {
        self.header.set_authoritative(aa);
    }

    /// Returns the question section.
    #[inline]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the answer section.
    #[inline]
    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    /// Returns the authority section.
    #[inline]
    pub fn authority(&self) -> &[ResourceRecord] {
        &self.authority
    }

    /// Returns the additional section.
    #[inline]
    pub fn additional(&self) -> &[ResourceRecord] {
        &self.additional
    }

    /// Adds a question.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
        self.header.qd_count = self.questions.len() as u16;
    }

    /// Adds an answer record.
    pub fn add_answer(&mut self, record: ResourceRecord) {
        self.answers.push(record);
        self.header.an_count = self.answers.len() as u16;
    }

    /// Adds multiple answer records.
    pub fn add_answers(&mut self, records: impl IntoIterator<Item = ResourceRecord>) {
        self.answers.extend(records);
        self.header.an_count = self.answers.len() as u16;
    }

    /// Parses a message from wire format.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data)?;
        let mut offset = HEADER_SIZE;

        let mut questions = Vec::with_capacity(header.qd_count as usize);
        for _ in 0..header.qd_count {
            let (q, consumed) = Question::parse(data, offset)?;
            questions.push(q);
            offset += consumed;
        }

        let parse_section = |count: u16, offset: &mut usize| -> Result<Vec<ResourceRecord>> {
            let mut parser = RecordParser::new(data, *offset, count);
            let mut records = Vec::with_capacity(count as usize);
            while let Some(r) = parser.next()? {
                // EDNS is out of scope; drop OPT pseudo-records.
                if r.rtype() != RecordType::OPT {
                    records.push(r);
                }
            }
            *offset = parser.offset();
            Ok(records)
        };

        let answers = parse_section(header.an_count, &mut offset)?;
        let authority = parse_section(header.ns_count, &mut offset)?;
        let additional = parse_section(header.ar_count, &mut offset)?;

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE
            + self.questions.iter().map(Question::wire_len).sum::<usize>()
            + self.answers.iter().map(ResourceRecord::wire_len).sum::<usize>()
            + self.authority.iter().map(ResourceRecord::wire_len).sum::<usize>()
            + self.additional.iter().map(ResourceRecord::wire_len).sum::<usize>()
    }

    /// Serializes the message to wire format (uncompressed names).
    pub fn to_wire(&self) -> Bytes {
        let mut header = self.header.clone();
        header.qd_count = self.questions.len() as u16;
        header.an_count = self.answers.len() as u16;
        header.ns_count = self.authority.len() as u16;
        header.ar_count = self.additional.len() as u16;

        let mut buf = BytesMut::with_capacity(self.wire_len());
        header.write_to(&mut buf);
        for q in &self.questions {
            q.write_to(&mut buf);
        }
        for r in &self.answers {
            r.write_to(&mut buf);
        }
        for r in &self.authority {
            r.write_to(&mut buf);
        }
        for r in &self.additional {
            r.write_to(&mut buf);
        }
        buf.freeze()
    }

    /// Truncates the message to fit `max_size` octets, setting TC when any
    /// record had to be dropped.
    pub fn truncate_to(&mut self, max_size: usize) {
        let mut truncated = false;
        while self.wire_len() > max_size {
            if self.additional.pop().is_some()
                || self.authority.pop().is_some()
                || self.answers.pop().is_some()
            {
                truncated = true;
                continue;
            }
            break;
        }
        if truncated {
            self.header.flags.insert(HeaderFlags::TC);
        }
        self.header.an_count = self.answers.len() as u16;
        self.header.ns_count = self.authority.len() as u16;
        self.header.ar_count = self.additional.len() as u16;
    }

    /// Parses a message, rejecting anything that is not a query.
    pub fn parse_query(data: &[u8]) -> Result<Self> {
        let message = Self::parse(data)?;
        if !message.header.is_query() {
            return Err(ProtoError::presentation("not a query"));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn query_response_roundtrip() {
        let question = Question::new("www.example.com.".parse().unwrap(), RecordType::A);
        let query = Message::query(0x4242, question.clone());

        let wire = query.to_wire();
        let parsed = Message::parse_query(&wire).unwrap();
        assert_eq!(parsed.id(), 0x4242);
        assert_eq!(parsed.questions(), &[question]);

        let mut response = Message::response_from(&parsed);
        response.set_authoritative(true);
        response.add_answer(ResourceRecord::a(
            "www.example.com.".parse().unwrap(),
            300,
            Ipv4Addr::new(1, 2, 3, 4),
        ));

        let wire = response.to_wire();
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.id(), 0x4242);
        assert!(parsed.is_authoritative());
        assert_eq!(parsed.answers().len(), 1);
        assert_eq!(parsed.questions().len(), 1);
    }

    #[test]
    fn truncation_sets_tc() {
        let question = Question::new("example.com.".parse().unwrap(), RecordType::A);
        let query = Message::query(1, question);
        let mut response = Message::response_from(&query);
        for i in 0..40 {
            response.add_answer(ResourceRecord::a(
                "example.com.".parse().unwrap(),
                300,
                Ipv4Addr::new(10, 0, 0, i),
            ));
        }

        response.truncate_to(512);
        assert!(response.wire_len() <= 512);
        assert!(response.header().flags.contains(HeaderFlags::TC));
        assert!(response.answers().len() < 40);
    }

    #[test]
    fn opt_records_are_dropped() {
        // Build a query with an OPT record in the additional section by hand.
        let question = Question::new("example.com.".parse().unwrap(), RecordType::A);
        let query = Message::query(9, question);
        let mut wire = BytesMut::from(&query.to_wire()[..]);

        // Root name, type 41, class 4096 (udp size), ttl 0, rdlength 0.
        wire.extend_from_slice(&[0, 0, 41, 16, 0, 0, 0, 0, 0, 0, 0]);
        // Patch ar_count.
        wire[11] = 1;

        let parsed = Message::parse(&wire).unwrap();
        assert!(parsed.additional().is_empty());
    }
}

//! DNS domain name representation and operations.
//!
//! Names are stored in uncompressed wire format (length-prefixed labels
//! terminated by the root label). Comparison, hashing and ordering are
//! case-insensitive per RFC 1035; ordering follows the canonical order of
//! RFC 4034 section 6.1.

use crate::error::{ProtoError, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use bytes::BytesMut;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Maximum number of compression pointer jumps before a parse is rejected.
const MAX_COMPRESSION_JUMPS: usize = 64;

/// A fully-qualified DNS domain name.
///
/// The wire buffer always carries the terminating root label, so every
/// `Name` is an FQDN. Most names fit the inline storage without allocating.
#[derive(Clone)]
pub struct Name {
    /// Uncompressed wire format, including the terminating zero octet.
    wire: SmallVec<[u8; 64]>,
    /// Number of labels, excluding the root label.
    label_count: u8,
}

impl Name {
    /// Returns the root name (`.`).
    pub fn root() -> Self {
        let mut wire = SmallVec::new();
        wire.push(0);
        Self {
            wire,
            label_count: 0,
        }
    }

    /// Returns true if this is the root name.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.label_count == 0
    }

    /// Returns the number of labels, excluding the root label.
    ///
    /// `www.example.com.` has three labels, which is also the value the
    /// RRSIG `labels` field wants for that owner name.
    #[inline]
    pub fn label_count(&self) -> usize {
        self.label_count as usize
    }

    /// Returns the uncompressed wire-format bytes, including the root label.
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the wire-format length in octets.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Iterates over the labels, leftmost first, excluding the root label.
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            wire: &self.wire,
            pos: 0,
        }
    }

    /// Lowercases the name in place.
    pub fn make_lowercase(&mut self) {
        for byte in self.wire.iter_mut() {
            byte.make_ascii_lowercase();
        }
    }

    /// Returns a lowercased copy of the name.
    #[must_use]
    pub fn lowercased(&self) -> Self {
        let mut copy = self.clone();
        copy.make_lowercase();
        copy
    }

    /// Returns true if `suffix` matches the trailing labels of this name.
    ///
    /// Every name ends with the root, and a name is a suffix of itself.
    /// Comparison is case-insensitive. This is the primitive behind
    /// longest-suffix zone matching.
    pub fn ends_with(&self, suffix: &Name) -> bool {
        let mine: SmallVec<[&[u8]; 8]> = self.labels().collect();
        let theirs: SmallVec<[&[u8]; 8]> = suffix.labels().collect();
        if theirs.len() > mine.len() {
            return false;
        }
        mine[mine.len() - theirs.len()..]
            .iter()
            .zip(theirs.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Writes the name in uncompressed wire format.
    pub fn write_wire(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.wire);
    }
}

/// Iterator over the labels of a name.
pub struct Labels<'a> {
    wire: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let len = *self.wire.get(self.pos)? as usize;
        if len == 0 {
            return None;
        }
        let start = self.pos + 1;
        self.pos = start + len;
        self.wire.get(start..start + len)
    }
}

impl FromStr for Name {
    type Err = ProtoError;

    /// Parses a name from dotted presentation format.
    ///
    /// A trailing dot is accepted and implied when absent; the parsed name
    /// is always fully qualified.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        let s = s.strip_suffix('.').unwrap_or(s);
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut label_count = 0u8;

        for part in s.split('.') {
            if part.is_empty() {
                return Err(ProtoError::presentation(format!("empty label in {s:?}")));
            }
            if part.len() > MAX_LABEL_LENGTH {
                return Err(ProtoError::LabelTooLong { length: part.len() });
            }
            for c in part.chars() {
                if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '*' {
                    return Err(ProtoError::InvalidLabelChar { character: c });
                }
            }
            wire.push(part.len() as u8);
            wire.extend_from_slice(part.as_bytes());
            label_count += 1;
        }

        wire.push(0);
        if wire.len() > MAX_NAME_LENGTH {
            return Err(ProtoError::NameTooLong { length: wire.len() });
        }

        Ok(Self { wire, label_count })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, ".");
        }
        for label in self.labels() {
            for &b in label {
                // Labels are validated on construction, so this is ASCII.
                write!(f, "{}", b as char)?;
            }
            write!(f, ".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}

impl PartialEq for Name {
    /// Case-insensitive comparison per DNS semantics.
    fn eq(&self, other: &Self) -> bool {
        self.label_count == other.label_count
            && self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &b in self.wire.iter() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    /// Canonical DNS name ordering per RFC 4034 section 6.1.
    fn cmp(&self, other: &Self) -> Ordering {
        let mine: SmallVec<[&[u8]; 8]> = self.labels().collect();
        let theirs: SmallVec<[&[u8]; 8]> = other.labels().collect();

        for (a, b) in mine.iter().rev().zip(theirs.iter().rev()) {
            let cmp = cmp_labels(a, b);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        mine.len().cmp(&theirs.len())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

/// Compares two labels byte-wise after ASCII lowercasing.
fn cmp_labels(a: &[u8], b: &[u8]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let cmp = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    a.len().cmp(&b.len())
}

/// Parser for names embedded in a DNS message.
///
/// Handles compression pointers (RFC 1035 section 4.1.4): pointers must point
/// strictly backward and chains are bounded to defeat pointer loops.
#[derive(Debug, Clone, Copy)]
pub struct NameParser<'a> {
    message: &'a [u8],
}

impl<'a> NameParser<'a> {
    /// Creates a parser over a complete message buffer.
    #[inline]
    pub const fn new(message: &'a [u8]) -> Self {
        Self { message }
    }

    /// Parses a name at `offset`.
    ///
    /// Returns the name and the number of bytes consumed at the original
    /// position (compression targets do not count toward consumption).
    pub fn parse_name(&self, offset: usize) -> Result<(Name, usize)> {
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut label_count = 0u8;
        let mut consumed = 0;
        let mut pos = offset;
        let mut jumps = 0;
        let mut jumped = false;

        loop {
            let len_byte = *self
                .message
                .get(pos)
                .ok_or(ProtoError::UnexpectedEof { offset: pos })?;

            if len_byte >= 0xC0 {
                let low = *self
                    .message
                    .get(pos + 1)
                    .ok_or(ProtoError::UnexpectedEof { offset: pos + 1 })?;
                let target = u16::from_be_bytes([len_byte & 0x3F, low]) as usize;
                if target >= pos {
                    return Err(ProtoError::InvalidPointer { offset: pos });
                }
                if !jumped {
                    consumed = pos - offset + 2;
                    jumped = true;
                }
                jumps += 1;
                if jumps > MAX_COMPRESSION_JUMPS {
                    return Err(ProtoError::TooManyJumps);
                }
                pos = target;
                continue;
            }

            if len_byte >= 0x40 {
                return Err(ProtoError::InvalidPointer { offset: pos });
            }

            let len = len_byte as usize;
            if len == 0 {
                wire.push(0);
                if !jumped {
                    consumed = pos - offset + 1;
                }
                break;
            }

            let label = self
                .message
                .get(pos + 1..pos + 1 + len)
                .ok_or(ProtoError::UnexpectedEof {
                    offset: pos + 1 + len,
                })?;
            if wire.len() + 1 + len > MAX_NAME_LENGTH {
                return Err(ProtoError::NameTooLong {
                    length: wire.len() + 1 + len,
                });
            }
            wire.push(len as u8);
            wire.extend_from_slice(label);
            label_count += 1;
            pos += 1 + len;
        }

        Ok((Name { wire, label_count }, consumed))
    }
}

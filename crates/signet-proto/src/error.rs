//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding, decoding or parsing DNS data.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A label exceeded 63 octets.
    #[error("label exceeds 63 octets ({length})")]
    LabelTooLong {
        /// Offending label length.
        length: usize,
    },

    /// A name exceeded 255 octets in wire format.
    #[error("name exceeds 255 octets ({length})")]
    NameTooLong {
        /// Offending name length.
        length: usize,
    },

    /// A label contained a character outside the accepted set.
    #[error("invalid character {character:?} in label")]
    InvalidLabelChar {
        /// The rejected character.
        character: char,
    },

    /// The message ended before a structure was complete.
    #[error("unexpected end of message at offset {offset}")]
    UnexpectedEof {
        /// Offset at which more data was expected.
        offset: usize,
    },

    /// A compression pointer pointed forward or at itself.
    #[error("invalid compression pointer at offset {offset}")]
    InvalidPointer {
        /// Offset of the pointer.
        offset: usize,
    },

    /// Compression pointer chain exceeded the jump limit.
    #[error("too many compression pointer jumps")]
    TooManyJumps,

    /// RDATA did not match its type's wire layout.
    #[error("invalid {rtype} rdata: {reason}")]
    InvalidRdata {
        /// Record type mnemonic.
        rtype: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// A presentation-format line could not be parsed.
    #[error("malformed record text: {0}")]
    Presentation(String),

    /// Presentation data for a type this library has no parser for.
    #[error("no presentation parser for record type {0}")]
    UnsupportedType(String),
}

impl ProtoError {
    /// Shorthand for an [`ProtoError::InvalidRdata`].
    pub fn invalid_rdata(rtype: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRdata {
            rtype,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ProtoError::Presentation`].
    pub fn presentation(reason: impl Into<String>) -> Self {
        Self::Presentation(reason.into())
    }
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

//! DNS record classes.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// A DNS class. Everything this server stores is `IN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Class {
    /// Internet.
    IN,
    /// Query for any class.
    ANY,
    /// Any other class, by number.
    Other(u16),
}

impl Class {
    /// Converts from the wire class code.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::IN,
            255 => Self::ANY,
            other => Self::Other(other),
        }
    }

    /// Converts to the wire class code.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::IN => 1,
            Self::ANY => 255,
            Self::Other(value) => value,
        }
    }
}

impl Default for Class {
    fn default() -> Self {
        Self::IN
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IN => write!(f, "IN"),
            Self::ANY => write!(f, "ANY"),
            Self::Other(value) => write!(f, "CLASS{value}"),
        }
    }
}

impl FromStr for Class {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "IN" => Self::IN,
            "ANY" => Self::ANY,
            _ => {
                let value = upper
                    .strip_prefix("CLASS")
                    .and_then(|n| n.parse::<u16>().ok())
                    .ok_or_else(|| ProtoError::presentation(format!("unknown class {s:?}")))?;
                Self::from_u16(value)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        assert_eq!(Class::from_u16(1), Class::IN);
        assert_eq!(Class::IN.to_u16(), 1);
        assert_eq!("IN".parse::<Class>().unwrap(), Class::IN);
        assert_eq!("CLASS3".parse::<Class>().unwrap(), Class::Other(3));
    }
}

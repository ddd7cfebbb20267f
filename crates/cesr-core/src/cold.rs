//! Cold start classification.
//!
//! The top three bits of the first byte of any CESR element (its tritet)
//! tell a parser with no prior context what follows: a serialized message
//! body, a text-domain code, or a binary-domain code.

use std::fmt;

use crate::b64;
use crate::error::CoreError;

/// Tritet values of the first byte of a stream element.
pub mod tritet {
    /// Reserved, never valid at a cold start.
    pub const FREE: u8 = 0o0;
    /// Text count code (`-`).
    pub const CT_B64: u8 = 0o1;
    /// Text op code (`_`).
    pub const OP_B64: u8 = 0o2;
    /// JSON map start.
    pub const JSON: u8 = 0o3;
    /// MessagePack fixmap start.
    pub const MGPK1: u8 = 0o4;
    /// CBOR map start.
    pub const CBOR: u8 = 0o5;
    /// MessagePack map16/map32 start.
    pub const MGPK2: u8 = 0o6;
    /// Binary count or op code.
    pub const CT_OP_B2: u8 = 0o7;
}

/// What a cold start byte announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cold {
    /// A serialized message body (JSON, CBOR or MGPK).
    Msg,
    /// Text-domain (qb64) codes.
    Txt,
    /// Binary-domain (qb2) codes.
    Bny,
}

impl Cold {
    /// The code domain for `Txt`/`Bny`, `None` for a message body.
    pub fn domain(self) -> Option<Domain> {
        match self {
            Cold::Msg => None,
            Cold::Txt => Some(Domain::Text),
            Cold::Bny => Some(Domain::Binary),
        }
    }
}

impl fmt::Display for Cold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cold::Msg => write!(f, "message"),
            Cold::Txt => write!(f, "text"),
            Cold::Bny => write!(f, "binary"),
        }
    }
}

/// Classify the first byte of `bytes`.
pub fn sniff(bytes: &[u8]) -> Result<Cold, CoreError> {
    let first = *bytes.first().ok_or(CoreError::EmptyStream)?;
    match first >> 5 {
        tritet::CT_B64 | tritet::OP_B64 => Ok(Cold::Txt),
        tritet::JSON | tritet::MGPK1 | tritet::CBOR | tritet::MGPK2 => Ok(Cold::Msg),
        tritet::CT_OP_B2 => Ok(Cold::Bny),
        other => Err(CoreError::ColdStart { tritet: other }),
    }
}

/// The two code domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// qb64: one byte per base64 character.
    Text,
    /// qb2: three bytes per four characters.
    Binary,
}

impl Domain {
    /// Byte length of `chars` base64 characters in this domain.
    ///
    /// `chars` must be quadlet aligned for the binary domain.
    pub fn byte_len(self, chars: usize) -> usize {
        match self {
            Domain::Text => chars,
            Domain::Binary => chars * 3 / 4,
        }
    }

    /// Bytes per counted quadlet (text) or triplet (binary).
    pub fn unit(self) -> usize {
        match self {
            Domain::Text => 4,
            Domain::Binary => 3,
        }
    }

    /// Read the first `n` code characters of `bytes`.
    pub fn lead(self, bytes: &[u8], n: usize) -> Result<String, CoreError> {
        match self {
            Domain::Text => {
                let head = bytes.get(..n).ok_or(CoreError::InsufficientBytes {
                    needed: n,
                    available: bytes.len(),
                })?;
                for &c in head {
                    b64::digit(c)?;
                }
                Ok(head.iter().map(|&c| c as char).collect())
            }
            Domain::Binary => b64::sextets(bytes, n),
        }
    }

    /// Convert a complete element in this domain to qb64 text.
    pub fn to_text(self, bytes: &[u8]) -> Result<String, CoreError> {
        match self {
            Domain::Text => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| CoreError::DecodingError(e.to_string())),
            Domain::Binary => Ok(b64::encode(bytes)),
        }
    }
}

//! Indexed signatures.
//!
//! An indexed primitive carries, inside its soft code, the offset of the
//! signing key in the controller's current key list and, for the big codes,
//! a second offset into the prior next-key digest list.

use std::fmt;

use crate::b64;
use crate::cold::Domain;
use crate::error::{CodeTable, CoreError};
use crate::matter::{pad_encode, strip_pad};

/// Indexed derivation codes (keripy v1 `IdrDex`).
pub mod codex {
    pub const ED25519_SIG: &str = "A";
    pub const ED25519_CRT_SIG: &str = "B";
    pub const ECDSA_256K1_SIG: &str = "C";
    pub const ECDSA_256K1_CRT_SIG: &str = "D";
    pub const ECDSA_256R1_SIG: &str = "E";
    pub const ECDSA_256R1_CRT_SIG: &str = "F";
    pub const ED448_SIG: &str = "0A";
    pub const ED448_CRT_SIG: &str = "0B";
    pub const ED25519_BIG_SIG: &str = "2A";
    pub const ED25519_BIG_CRT_SIG: &str = "2B";
    pub const ECDSA_256K1_BIG_SIG: &str = "2C";
    pub const ECDSA_256K1_BIG_CRT_SIG: &str = "2D";
    pub const ECDSA_256R1_BIG_SIG: &str = "2E";
    pub const ECDSA_256R1_BIG_CRT_SIG: &str = "2F";
    pub const ED448_BIG_SIG: &str = "3A";
    pub const ED448_BIG_CRT_SIG: &str = "3B";
    pub const TBD0: &str = "0z";
    pub const TBD1: &str = "1z";
    pub const TBD4: &str = "4z";

    /// Ed25519 signature codes.
    pub const ED25519: &[&str] = &[
        ED25519_SIG,
        ED25519_CRT_SIG,
        ED25519_BIG_SIG,
        ED25519_BIG_CRT_SIG,
    ];
}

/// Code part sizes of an indexed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xizage {
    pub hs: usize,
    pub ss: usize,
    /// Characters of the soft part holding the other index.
    pub os: usize,
    pub fs: Option<usize>,
    pub ls: usize,
}

impl Xizage {
    const fn new(hs: usize, ss: usize, os: usize, fs: Option<usize>, ls: usize) -> Self {
        Self { hs, ss, os, fs, ls }
    }

    pub const fn cs(&self) -> usize {
        self.hs + self.ss
    }
}

/// Hard size selected by the first code character.
pub fn hardage(first: u8) -> Option<usize> {
    match first {
        b'A'..=b'Z' | b'a'..=b'z' => Some(1),
        b'0'..=b'4' => Some(2),
        _ => None,
    }
}

/// Size table entry for a hard code.
pub fn xizage(code: &str) -> Option<Xizage> {
    let xizage = match code {
        "A" | "B" | "C" | "D" | "E" | "F" => Xizage::new(1, 1, 0, Some(88), 0),
        "0A" | "0B" => Xizage::new(2, 2, 1, Some(156), 0),
        "2A" | "2B" | "2C" | "2D" | "2E" | "2F" => Xizage::new(2, 4, 2, Some(92), 0),
        "3A" | "3B" => Xizage::new(2, 6, 3, Some(160), 0),
        "0z" => Xizage::new(2, 2, 0, None, 0),
        "1z" => Xizage::new(2, 2, 1, Some(76), 1),
        "4z" => Xizage::new(2, 6, 3, Some(80), 1),
        _ => return None,
    };
    Some(xizage)
}

struct Sniffed {
    hard: String,
    xizage: Xizage,
    index: u32,
    ondex: Option<u32>,
    fs: usize,
}

fn sniff_code(bytes: &[u8], domain: Domain) -> Result<Sniffed, CoreError> {
    let first = domain.lead(bytes, 1)?;
    let hs = hardage(first.as_bytes()[0])
        .ok_or_else(|| CoreError::unknown(CodeTable::Indexer, first.clone()))?;
    let hard = domain.lead(bytes, hs)?;
    let xizage =
        xizage(&hard).ok_or_else(|| CoreError::unknown(CodeTable::Indexer, hard.clone()))?;
    let code = domain.lead(bytes, xizage.cs())?;
    let soft = &code.as_bytes()[xizage.hs..];
    let ms = xizage.ss - xizage.os;
    let index = b64::b64_to_int(&soft[..ms])? as u32;
    let ondex = if xizage.os > 0 {
        Some(b64::b64_to_int(&soft[ms..])? as u32)
    } else {
        None
    };
    let fs = xizage.fs.unwrap_or(xizage.cs() + index as usize * 4);
    Ok(Sniffed {
        hard,
        xizage,
        index,
        ondex,
        fs,
    })
}

/// Byte length of the indexed primitive at the start of `bytes`.
pub fn sniff_size(bytes: &[u8], domain: Domain) -> Result<usize, CoreError> {
    let sniffed = sniff_code(bytes, domain)?;
    Ok(domain.byte_len(sniffed.fs))
}

/// Byte length, index and ondex of the indexed primitive at the start of
/// `bytes`, read from its code alone.
pub fn sniff(bytes: &[u8], domain: Domain) -> Result<(usize, u32, Option<u32>), CoreError> {
    let sniffed = sniff_code(bytes, domain)?;
    Ok((domain.byte_len(sniffed.fs), sniffed.index, sniffed.ondex))
}

/// A parsed indexed signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Indexer {
    code: String,
    index: u32,
    ondex: Option<u32>,
    raw: Vec<u8>,
    qb64: String,
}

impl Indexer {
    /// Encode a signature with its key index.
    ///
    /// Big codes take an other index that defaults to `index`; small codes
    /// reject an other index that differs from `index`.
    pub fn from_raw(
        code: &str,
        raw: &[u8],
        index: u32,
        ondex: Option<u32>,
    ) -> Result<Self, CoreError> {
        let xizage = xizage(code).ok_or_else(|| CoreError::unknown(CodeTable::Indexer, code))?;
        let fs = xizage.fs.ok_or_else(|| {
            CoreError::InvalidPrimitive(format!("cannot encode variable indexed code {code}"))
        })?;
        let ms = xizage.ss - xizage.os;
        let overflow = |count: u32| CoreError::CountOverflow {
            code: code.to_owned(),
            count: u64::from(count),
        };

        let mut soft = b64::int_to_b64(u64::from(index), ms).ok_or_else(|| overflow(index))?;
        let stored_ondex = if xizage.os > 0 {
            let other = ondex.unwrap_or(index);
            soft.push_str(
                &b64::int_to_b64(u64::from(other), xizage.os).ok_or_else(|| overflow(other))?,
            );
            Some(other)
        } else {
            if matches!(ondex, Some(o) if o != index) {
                return Err(CoreError::InvalidPrimitive(format!(
                    "code {code} cannot carry other index distinct from {index}"
                )));
            }
            None
        };

        let expected = (fs - xizage.cs()) * 3 / 4 - xizage.ls;
        if raw.len() != expected {
            return Err(CoreError::InvalidPrimitive(format!(
                "code {code} takes {expected} raw bytes, got {}",
                raw.len()
            )));
        }
        Ok(Self {
            code: code.to_owned(),
            index,
            ondex: stored_ondex,
            raw: raw.to_vec(),
            qb64: pad_encode(&format!("{code}{soft}"), xizage.ls, raw),
        })
    }

    /// Parse the indexed primitive at the start of `text`.
    pub fn from_qb64b(text: &[u8]) -> Result<Self, CoreError> {
        let sniffed = sniff_code(text, Domain::Text)?;
        let full = text.get(..sniffed.fs).ok_or(CoreError::InsufficientBytes {
            needed: sniffed.fs,
            available: text.len(),
        })?;
        let raw = strip_pad(full, sniffed.xizage.cs(), sniffed.xizage.ls)?;
        Ok(Self {
            code: sniffed.hard,
            index: sniffed.index,
            ondex: sniffed.ondex,
            raw,
            qb64: full.iter().map(|&c| c as char).collect(),
        })
    }

    pub fn from_qb64(text: &str) -> Result<Self, CoreError> {
        let indexer = Self::from_qb64b(text.as_bytes())?;
        if indexer.qb64.len() != text.len() {
            return Err(CoreError::InvalidPrimitive(format!(
                "{} trailing characters after {}",
                text.len() - indexer.qb64.len(),
                indexer.code
            )));
        }
        Ok(indexer)
    }

    /// Parse the binary indexed primitive at the start of `bytes`.
    pub fn from_qb2(bytes: &[u8]) -> Result<Self, CoreError> {
        let size = sniff_size(bytes, Domain::Binary)?;
        let full = bytes.get(..size).ok_or(CoreError::InsufficientBytes {
            needed: size,
            available: bytes.len(),
        })?;
        Self::from_qb64b(b64::encode(full).as_bytes())
    }

    pub fn from_stream(bytes: &[u8], domain: Domain) -> Result<Self, CoreError> {
        match domain {
            Domain::Text => Self::from_qb64b(bytes),
            Domain::Binary => Self::from_qb2(bytes),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Offset of the signing key in the current key list.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Offset in the prior next-key digest list, present on big codes.
    pub fn ondex(&self) -> Option<u32> {
        self.ondex
    }

    /// The raw signature.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn qb64(&self) -> &str {
        &self.qb64
    }

    pub fn qb64b(&self) -> &[u8] {
        self.qb64.as_bytes()
    }

    pub fn qb2(&self) -> Vec<u8> {
        b64::decode(self.qb64.as_bytes()).unwrap_or_default()
    }
}

impl fmt::Debug for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Indexer({}, index={})", self.code, self.index)
    }
}

impl fmt::Display for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64)
    }
}

//! Self-framing primitives.
//!
//! A primitive is a derivation code followed by its material. The code's
//! first character fixes the hard size, the hard code fixes the soft size,
//! and together they give the full size: fixed in the table, or counted in
//! quadlets by the soft field for variable-size codes. A parser therefore
//! never needs to look past the code to know how long a primitive is.

use std::fmt;

use crate::b64;
use crate::cold::Domain;
use crate::error::{CodeTable, CoreError};

/// Derivation codes (keripy v1 `MtrDex`).
pub mod codex {
    pub const ED25519_SEED: &str = "A";
    pub const ED25519N: &str = "B";
    pub const X25519: &str = "C";
    pub const ED25519: &str = "D";
    pub const BLAKE3_256: &str = "E";
    pub const BLAKE2B_256: &str = "F";
    pub const BLAKE2S_256: &str = "G";
    pub const SHA3_256: &str = "H";
    pub const SHA2_256: &str = "I";
    pub const ECDSA_256K1_SEED: &str = "J";
    pub const ED448_SEED: &str = "K";
    pub const X448: &str = "L";
    pub const SHORT: &str = "M";
    pub const BIG: &str = "N";
    pub const X25519_PRIVATE: &str = "O";
    pub const X25519_CIPHER_SEED: &str = "P";
    pub const ECDSA_256R1_SEED: &str = "Q";
    pub const SALT_128: &str = "0A";
    pub const ED25519_SIG: &str = "0B";
    pub const ECDSA_256K1_SIG: &str = "0C";
    pub const BLAKE3_512: &str = "0D";
    pub const BLAKE2B_512: &str = "0E";
    pub const SHA3_512: &str = "0F";
    pub const SHA2_512: &str = "0G";
    pub const LONG: &str = "0H";
    pub const ECDSA_256R1_SIG: &str = "0I";
    pub const ECDSA_256K1N: &str = "1AAA";
    pub const ECDSA_256K1: &str = "1AAB";
    pub const ED448N: &str = "1AAC";
    pub const ED448: &str = "1AAD";
    pub const ED448_SIG: &str = "1AAE";
    pub const TERN: &str = "1AAF";
    pub const DATETIME: &str = "1AAG";
    pub const X25519_CIPHER_SALT: &str = "1AAH";
    pub const ECDSA_256R1N: &str = "1AAI";
    pub const ECDSA_256R1: &str = "1AAJ";
    pub const NULL: &str = "1AAK";
    pub const TBD1: &str = "2AAA";
    pub const TBD2: &str = "3AAA";
    pub const STR_B64_L0: &str = "4A";
    pub const STR_B64_L1: &str = "5A";
    pub const STR_B64_L2: &str = "6A";
    pub const STR_B64_BIG_L0: &str = "7AAA";
    pub const STR_B64_BIG_L1: &str = "8AAA";
    pub const STR_B64_BIG_L2: &str = "9AAA";
    pub const BYTES_L0: &str = "4B";
    pub const BYTES_L1: &str = "5B";
    pub const BYTES_L2: &str = "6B";
    pub const BYTES_BIG_L0: &str = "7AAB";
    pub const BYTES_BIG_L1: &str = "8AAB";
    pub const BYTES_BIG_L2: &str = "9AAB";

    /// Codes whose material is a content digest.
    pub const DIGESTS: &[&str] = &[
        BLAKE3_256,
        BLAKE2B_256,
        BLAKE2S_256,
        SHA3_256,
        SHA2_256,
        BLAKE3_512,
        BLAKE2B_512,
        SHA3_512,
        SHA2_512,
    ];

    /// Codes whose material is a public verification key.
    pub const VERIFIERS: &[&str] = &[
        ED25519N,
        ED25519,
        ECDSA_256K1N,
        ECDSA_256K1,
        ED448N,
        ED448,
        ECDSA_256R1N,
        ECDSA_256R1,
    ];

    pub(crate) const STR_B64: [[&str; 3]; 2] = [
        [STR_B64_L0, STR_B64_L1, STR_B64_L2],
        [STR_B64_BIG_L0, STR_B64_BIG_L1, STR_B64_BIG_L2],
    ];

    pub(crate) const BYTES: [[&str; 3]; 2] = [
        [BYTES_L0, BYTES_L1, BYTES_L2],
        [BYTES_BIG_L0, BYTES_BIG_L1, BYTES_BIG_L2],
    ];
}

/// Code part sizes of a derivation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizage {
    /// Hard size in characters.
    pub hs: usize,
    /// Soft size in characters.
    pub ss: usize,
    /// Full size in characters; `None` for variable-size codes.
    pub fs: Option<usize>,
    /// Lead size in bytes prepended to the raw material.
    pub ls: usize,
}

impl Sizage {
    const fn fixed(hs: usize, fs: usize, ls: usize) -> Self {
        Self {
            hs,
            ss: 0,
            fs: Some(fs),
            ls,
        }
    }

    const fn variable(hs: usize, ss: usize, ls: usize) -> Self {
        Self {
            hs,
            ss,
            fs: None,
            ls,
        }
    }

    /// Combined hard and soft size.
    pub const fn cs(&self) -> usize {
        self.hs + self.ss
    }
}

/// Hard size selected by the first code character.
pub fn hardage(first: u8) -> Option<usize> {
    match first {
        b'A'..=b'Z' | b'a'..=b'z' => Some(1),
        b'0' | b'4' | b'5' | b'6' => Some(2),
        b'1' | b'2' | b'3' | b'7' | b'8' | b'9' => Some(4),
        _ => None,
    }
}

/// Size table entry for a hard code.
pub fn sizage(code: &str) -> Option<Sizage> {
    let sizage = match code {
        "A" | "B" | "C" | "D" | "E" | "F" | "G" | "H" | "I" | "J" | "O" | "Q" => {
            Sizage::fixed(1, 44, 0)
        }
        "K" | "L" => Sizage::fixed(1, 76, 0),
        "M" => Sizage::fixed(1, 4, 0),
        "N" => Sizage::fixed(1, 12, 0),
        "P" => Sizage::fixed(1, 124, 0),
        "0A" => Sizage::fixed(2, 24, 0),
        "0B" | "0C" | "0D" | "0E" | "0F" | "0G" | "0I" => Sizage::fixed(2, 88, 0),
        "0H" => Sizage::fixed(2, 8, 0),
        "1AAA" | "1AAB" | "1AAI" | "1AAJ" => Sizage::fixed(4, 48, 0),
        "1AAC" | "1AAD" => Sizage::fixed(4, 80, 0),
        "1AAE" => Sizage::fixed(4, 56, 0),
        "1AAF" => Sizage::fixed(4, 8, 0),
        "1AAG" => Sizage::fixed(4, 36, 0),
        "1AAH" => Sizage::fixed(4, 100, 0),
        "1AAK" => Sizage::fixed(4, 4, 0),
        "2AAA" => Sizage::fixed(4, 8, 1),
        "3AAA" => Sizage::fixed(4, 8, 2),
        "4A" | "4B" => Sizage::variable(2, 2, 0),
        "5A" | "5B" => Sizage::variable(2, 2, 1),
        "6A" | "6B" => Sizage::variable(2, 2, 2),
        "7AAA" | "7AAB" => Sizage::variable(4, 4, 0),
        "8AAA" | "8AAB" => Sizage::variable(4, 4, 1),
        "9AAA" | "9AAB" => Sizage::variable(4, 4, 2),
        _ => return None,
    };
    Some(sizage)
}

/// Read the leading derivation code. Returns the hard code, its sizes and
/// the full size in characters.
fn sniff_code(bytes: &[u8], domain: Domain) -> Result<(String, Sizage, usize), CoreError> {
    let first = domain.lead(bytes, 1)?;
    let hs = hardage(first.as_bytes()[0])
        .ok_or_else(|| CoreError::unknown(CodeTable::Matter, first.clone()))?;
    let hard = domain.lead(bytes, hs)?;
    let sizage = sizage(&hard).ok_or_else(|| CoreError::unknown(CodeTable::Matter, hard.clone()))?;
    let fs = match sizage.fs {
        Some(fs) => fs,
        None => {
            let code = domain.lead(bytes, sizage.cs())?;
            let quadlets = b64::b64_to_int(&code.as_bytes()[sizage.hs..])?;
            sizage.cs() + quadlets as usize * 4
        }
    };
    Ok((hard, sizage, fs))
}

/// Byte length of the primitive at the start of `bytes`.
///
/// Only the derivation code is read.
pub fn sniff_size(bytes: &[u8], domain: Domain) -> Result<usize, CoreError> {
    let (_, _, fs) = sniff_code(bytes, domain)?;
    Ok(domain.byte_len(fs))
}

/// A parsed and validated primitive.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Matter {
    code: String,
    raw: Vec<u8>,
    qb64: String,
}

impl Matter {
    /// Encode raw material under a derivation code.
    ///
    /// For variable-size codes any family member may be given; the lead size
    /// and small/big variant are picked from the material length.
    pub fn from_raw(code: &str, raw: &[u8]) -> Result<Self, CoreError> {
        let sizage = sizage(code).ok_or_else(|| CoreError::unknown(CodeTable::Matter, code))?;
        match sizage.fs {
            Some(fs) => {
                let cs = sizage.cs();
                let expected = (fs - cs) * 3 / 4 - sizage.ls;
                if raw.len() != expected {
                    return Err(CoreError::InvalidPrimitive(format!(
                        "code {code} takes {expected} raw bytes, got {}",
                        raw.len()
                    )));
                }
                let qb64 = pad_encode(code, sizage.ls, raw);
                debug_assert_eq!(qb64.len(), fs);
                Ok(Self {
                    code: code.to_owned(),
                    raw: raw.to_vec(),
                    qb64,
                })
            }
            None => Self::from_variable(code, raw),
        }
    }

    fn from_variable(code: &str, raw: &[u8]) -> Result<Self, CoreError> {
        let family = if codex::STR_B64.iter().flatten().any(|c| *c == code) {
            &codex::STR_B64
        } else if codex::BYTES.iter().flatten().any(|c| *c == code) {
            &codex::BYTES
        } else {
            return Err(CoreError::unknown(CodeTable::Matter, code));
        };
        let ls = (3 - raw.len() % 3) % 3;
        let quadlets = ((raw.len() + ls) / 3) as u64;
        let (code, soft) = match b64::int_to_b64(quadlets, 2) {
            Some(soft) => (family[0][ls], soft),
            None => {
                let soft = b64::int_to_b64(quadlets, 4).ok_or_else(|| CoreError::CountOverflow {
                    code: family[1][ls].to_owned(),
                    count: quadlets,
                })?;
                (family[1][ls], soft)
            }
        };
        let mut padded = vec![0u8; ls];
        padded.extend_from_slice(raw);
        Ok(Self {
            code: code.to_owned(),
            raw: raw.to_vec(),
            qb64: format!("{code}{soft}{}", b64::encode(&padded)),
        })
    }

    /// Parse the primitive at the start of `text`; trailing bytes are ignored.
    pub fn from_qb64b(text: &[u8]) -> Result<Self, CoreError> {
        let (code, sizage, fs) = sniff_code(text, Domain::Text)?;
        let full = text.get(..fs).ok_or(CoreError::InsufficientBytes {
            needed: fs,
            available: text.len(),
        })?;
        let raw = strip_pad(full, sizage.cs(), sizage.ls)?;
        Ok(Self {
            code,
            raw,
            qb64: full.iter().map(|&c| c as char).collect(),
        })
    }

    /// Parse exactly one text primitive.
    pub fn from_qb64(text: &str) -> Result<Self, CoreError> {
        let matter = Self::from_qb64b(text.as_bytes())?;
        if matter.qb64.len() != text.len() {
            return Err(CoreError::InvalidPrimitive(format!(
                "{} trailing characters after {}",
                text.len() - matter.qb64.len(),
                matter.code
            )));
        }
        Ok(matter)
    }

    /// Parse the binary primitive at the start of `bytes`.
    pub fn from_qb2(bytes: &[u8]) -> Result<Self, CoreError> {
        let size = sniff_size(bytes, Domain::Binary)?;
        let full = bytes.get(..size).ok_or(CoreError::InsufficientBytes {
            needed: size,
            available: bytes.len(),
        })?;
        Self::from_qb64b(b64::encode(full).as_bytes())
    }

    /// Parse the primitive at the start of `bytes` in either domain.
    pub fn from_stream(bytes: &[u8], domain: Domain) -> Result<Self, CoreError> {
        match domain {
            Domain::Text => Self::from_qb64b(bytes),
            Domain::Binary => Self::from_qb2(bytes),
        }
    }

    /// Encode base64 text as a variable-size `StrB64` primitive.
    pub fn from_bext(bext: &str) -> Result<Self, CoreError> {
        for &c in bext.as_bytes() {
            b64::digit(c)?;
        }
        let ts = bext.len() % 4;
        let ws = (4 - ts) % 4;
        let ls = (3 - ts) % 3;
        let base = format!("{}{bext}", "A".repeat(ws));
        let paw = b64::decode(base.as_bytes())?;
        Self::from_raw(codex::STR_B64_L0, &paw[ls..])
    }

    /// Encode a sequence number as a 128-bit `Salt_128` primitive.
    pub fn from_sn(sn: u128) -> Self {
        let raw = sn.to_be_bytes();
        Self {
            code: codex::SALT_128.to_owned(),
            raw: raw.to_vec(),
            qb64: pad_encode(codex::SALT_128, 0, &raw),
        }
    }

    /// The hard code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Raw material without code or lead bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn qb64(&self) -> &str {
        &self.qb64
    }

    pub fn qb64b(&self) -> &[u8] {
        self.qb64.as_bytes()
    }

    /// Binary domain encoding.
    pub fn qb2(&self) -> Vec<u8> {
        b64::decode(self.qb64.as_bytes()).unwrap_or_default()
    }

    /// Full size in text characters.
    pub fn full_size(&self) -> usize {
        self.qb64.len()
    }

    pub fn is_digest(&self) -> bool {
        codex::DIGESTS.contains(&self.code.as_str())
    }

    pub fn is_verifier(&self) -> bool {
        codex::VERIFIERS.contains(&self.code.as_str())
    }

    /// Sequence number carried by a `Salt_128` primitive.
    pub fn sn(&self) -> Option<u128> {
        if self.code != codex::SALT_128 {
            return None;
        }
        let bytes: [u8; 16] = self.raw.as_slice().try_into().ok()?;
        Some(u128::from_be_bytes(bytes))
    }

    /// Base64 text carried by a `StrB64` primitive.
    pub fn bext(&self) -> Option<String> {
        if !codex::STR_B64.iter().flatten().any(|c| *c == self.code) {
            return None;
        }
        let ls = sizage(&self.code)?.ls;
        let mut padded = vec![0u8; ls];
        padded.extend_from_slice(&self.raw);
        let bext = b64::encode(&padded);
        let ws = if ls == 0 {
            usize::from(bext.starts_with('A'))
        } else {
            (ls + 1) % 4
        };
        Some(bext[ws..].to_owned())
    }
}

/// Append material to a complete code, zero padding it onto a 24-bit boundary.
pub(crate) fn pad_encode(code: &str, ls: usize, raw: &[u8]) -> String {
    let ps = code.len() % 4;
    let mut padded = vec![0u8; ps + ls];
    padded.extend_from_slice(raw);
    let text = b64::encode(&padded);
    format!("{code}{}", &text[ps..])
}

/// Strip the code, pad and lead bytes from a complete text primitive.
pub(crate) fn strip_pad(full: &[u8], cs: usize, ls: usize) -> Result<Vec<u8>, CoreError> {
    let ps = cs % 4;
    let mut base = vec![b'A'; ps];
    base.extend_from_slice(&full[cs..]);
    let paw = b64::decode(&base)?;
    let lead = ps + ls;
    if paw.len() < lead || paw[..lead].iter().any(|&b| b != 0) {
        return Err(CoreError::InvalidPrimitive(
            "nonzero pad or lead bits".into(),
        ));
    }
    Ok(paw[lead..].to_vec())
}

impl fmt::Debug for Matter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matter({})", self.qb64)
    }
}

impl fmt::Display for Matter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64)
    }
}

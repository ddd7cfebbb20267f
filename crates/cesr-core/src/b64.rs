//! URL-safe base64 helpers for qb64 text and its binary (qb2) twin.
//!
//! CESR code fields are big-endian base64 numerals and every full primitive
//! aligns on 24-bit boundaries, so the text and binary domains convert
//! losslessly in blocks of four characters or three bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::CoreError;

/// The URL-safe base64 alphabet in digit order.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Value of a single base64 digit.
pub fn digit(c: u8) -> Result<u8, CoreError> {
    match c {
        b'A'..=b'Z' => Ok(c - b'A'),
        b'a'..=b'z' => Ok(c - b'a' + 26),
        b'0'..=b'9' => Ok(c - b'0' + 52),
        b'-' => Ok(62),
        b'_' => Ok(63),
        other => Err(CoreError::InvalidBase64(other as char)),
    }
}

/// Encode `n` as a base64 numeral padded to exactly `len` digits.
///
/// Returns `None` when `n` does not fit.
pub fn int_to_b64(n: u64, len: usize) -> Option<String> {
    if len < 11 && n >= 1u64 << (6 * len) {
        return None;
    }
    let mut out = vec![b'A'; len];
    let mut rest = n;
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(rest & 0x3f) as usize];
        rest >>= 6;
    }
    if rest != 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

/// Decode a base64 numeral.
pub fn b64_to_int(text: &[u8]) -> Result<u64, CoreError> {
    text.iter().try_fold(0u64, |acc, &c| {
        let d = digit(c)?;
        acc.checked_mul(64)
            .map(|v| v + u64::from(d))
            .ok_or_else(|| CoreError::InvalidPrimitive("numeral overflows u64".into()))
    })
}

/// Base64 encode without padding.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Base64 decode text whose length is a multiple of four.
pub fn decode(text: &[u8]) -> Result<Vec<u8>, CoreError> {
    if text.len() % 4 != 0 {
        return Err(CoreError::InvalidPrimitive(format!(
            "text length {} is not quadlet aligned",
            text.len()
        )));
    }
    if let Some(&bad) = text.iter().find(|c| digit(**c).is_err()) {
        return Err(CoreError::InvalidBase64(bad as char));
    }
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Read the first `n` base64 characters packed into binary bytes.
///
/// Only the bytes covering those sextets are touched.
pub fn sextets(bytes: &[u8], n: usize) -> Result<String, CoreError> {
    let needed = (n * 6 + 7) / 8;
    if bytes.len() < needed {
        return Err(CoreError::InsufficientBytes {
            needed,
            available: bytes.len(),
        });
    }
    let mut out = String::with_capacity(n);
    for i in 0..n {
        let bit = i * 6;
        let at = bit / 8;
        let hi = u16::from(bytes[at]) << 8;
        let lo = u16::from(bytes.get(at + 1).copied().unwrap_or(0));
        let value = ((hi | lo) >> (10 - bit % 8)) & 0x3f;
        out.push(ALPHABET[value as usize] as char);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_trip() {
        assert_eq!(int_to_b64(0, 2).unwrap(), "AA");
        assert_eq!(int_to_b64(1, 2).unwrap(), "AB");
        assert_eq!(int_to_b64(64, 2).unwrap(), "BA");
        assert_eq!(int_to_b64(4095, 2).unwrap(), "__");
        assert!(int_to_b64(4096, 2).is_none());
        assert_eq!(b64_to_int(b"__").unwrap(), 4095);
        assert_eq!(b64_to_int(b"AAB").unwrap(), 1);
    }

    #[test]
    fn test_digit_rejects_padding() {
        assert_eq!(digit(b'='), Err(CoreError::InvalidBase64('=')));
    }

    #[test]
    fn test_sextets_match_text() {
        let text = "-AABAAApXLez";
        let bytes = decode(text.as_bytes()).unwrap();
        assert_eq!(sextets(&bytes, 1).unwrap(), "-");
        assert_eq!(sextets(&bytes, 4).unwrap(), "-AAB");
        assert_eq!(sextets(&bytes, 7).unwrap(), "-AABAAA");
        assert_eq!(sextets(&bytes, 12).unwrap(), text);
    }

    #[test]
    fn test_sextets_insufficient() {
        assert!(matches!(
            sextets(&[0xf8], 2),
            Err(CoreError::InsufficientBytes { needed: 2, available: 1 })
        ));
    }

    #[test]
    fn test_decode_rejects_misaligned() {
        assert!(decode(b"ABC").is_err());
        assert!(decode(b"AB=C").is_err());
    }
}

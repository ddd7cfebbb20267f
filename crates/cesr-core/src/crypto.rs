//! Digests and signature verification over CESR primitives.
//!
//! Wraps Blake3 hashing and Ed25519 verification so callers work with
//! derivation-coded primitives instead of raw arrays.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::{CoreError, ValidationError};
use crate::indexer::{self, Indexer};
use crate::matter::{codex, Matter};

/// Digest `data` under a digest derivation code.
pub fn digest(code: &str, data: &[u8]) -> Result<Matter, CoreError> {
    match code {
        codex::BLAKE3_256 => Matter::from_raw(code, blake3::hash(data).as_bytes()),
        codex::BLAKE3_512 => {
            let mut hasher = blake3::Hasher::new();
            hasher.update(data);
            let mut out = [0u8; 64];
            hasher.finalize_xof().fill(&mut out);
            Matter::from_raw(code, &out)
        }
        other => Err(CoreError::UnsupportedDigest(other.to_owned())),
    }
}

/// Whether `code` can be produced by [`digest`].
pub fn is_supported_digest(code: &str) -> bool {
    matches!(code, codex::BLAKE3_256 | codex::BLAKE3_512)
}

/// Verify a raw Ed25519 signature against a verification key primitive.
pub fn verify(verfer: &Matter, message: &[u8], signature: &[u8]) -> Result<(), ValidationError> {
    if !matches!(verfer.code(), codex::ED25519 | codex::ED25519N) {
        return Err(ValidationError::UnsupportedCode(verfer.code().to_owned()));
    }
    let key: &[u8; 32] = verfer
        .raw()
        .try_into()
        .map_err(|_| ValidationError::InvalidKey)?;
    let verifying_key = VerifyingKey::from_bytes(key).map_err(|_| ValidationError::InvalidKey)?;
    let sig = Signature::from_slice(signature).map_err(|_| ValidationError::SignatureFailed)?;
    verifying_key
        .verify(message, &sig)
        .map_err(|_| ValidationError::SignatureFailed)
}

/// Verify a non-indexed signature (cigar).
pub fn verify_cigar(verfer: &Matter, message: &[u8], cigar: &Matter) -> Result<(), ValidationError> {
    if cigar.code() != codex::ED25519_SIG {
        return Err(ValidationError::UnsupportedCode(cigar.code().to_owned()));
    }
    verify(verfer, message, cigar.raw())
}

/// Verify an indexed signature (siger).
pub fn verify_siger(verfer: &Matter, message: &[u8], siger: &Indexer) -> Result<(), ValidationError> {
    if !indexer::codex::ED25519.contains(&siger.code()) {
        return Err(ValidationError::UnsupportedCode(siger.code().to_owned()));
    }
    verify(verfer, message, siger.raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_digest() {
        let d = digest(codex::BLAKE3_256, b"abc").unwrap();
        assert_eq!(d.code(), codex::BLAKE3_256);
        assert_eq!(d.raw(), blake3::hash(b"abc").as_bytes());
        assert_eq!(d.full_size(), 44);

        let d512 = digest(codex::BLAKE3_512, b"abc").unwrap();
        assert_eq!(d512.full_size(), 88);
        assert_eq!(&d512.raw()[..32], d.raw());
    }

    #[test]
    fn test_unsupported_digest() {
        assert_eq!(
            digest(codex::SHA2_256, b"abc"),
            Err(CoreError::UnsupportedDigest("I".into()))
        );
        assert!(!is_supported_digest(codex::SHA3_256));
    }

    #[test]
    fn test_verify_cigar_and_siger() {
        use ed25519_dalek::{Signer, SigningKey};

        let sk = SigningKey::from_bytes(&[7u8; 32]);
        let verfer = Matter::from_raw(codex::ED25519, sk.verifying_key().as_bytes()).unwrap();
        let sig = sk.sign(b"body").to_bytes();

        let cigar = Matter::from_raw(codex::ED25519_SIG, &sig).unwrap();
        assert!(verify_cigar(&verfer, b"body", &cigar).is_ok());
        assert_eq!(
            verify_cigar(&verfer, b"bodx", &cigar),
            Err(ValidationError::SignatureFailed)
        );

        let siger = Indexer::from_raw(indexer::codex::ED25519_SIG, &sig, 0, None).unwrap();
        assert!(verify_siger(&verfer, b"body", &siger).is_ok());
    }

    #[test]
    fn test_verify_rejects_non_key() {
        let d = digest(codex::BLAKE3_256, b"abc").unwrap();
        assert_eq!(
            verify(&d, b"abc", &[0u8; 64]),
            Err(ValidationError::UnsupportedCode("E".into()))
        );
    }
}

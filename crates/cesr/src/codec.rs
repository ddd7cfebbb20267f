//! The Codec: one entry point for bodies, streams and signatures.
//!
//! The codec ties the primitive codec, the self-addressing container and
//! the stream parser together behind a single configuration.

use bytes::Bytes;
use cesr_core::matter::codex;
use cesr_core::{crypto, Kind, Matter, Sad, SadMap, ValidationError};
use cesr_parser::{Message, Parser, ParserConfig, PrimitiveKind};
use serde::{Deserialize, Serialize};

use crate::error::{CesrError, Result};

/// Configuration for the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CesrConfig {
    /// Stream parser configuration.
    pub parser: ParserConfig,
    /// Serialization forced on outgoing bodies; `None` keeps the one named
    /// by the body's version string.
    pub kind: Option<Kind>,
    /// Digest code for new SAIDs.
    pub digest_code: String,
    /// Check the SAID of every deserialized or parsed body. Off by default;
    /// [`Codec::verify`] is always available.
    pub verify_saids: bool,
}

impl Default for CesrConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            kind: None,
            digest_code: codex::BLAKE3_256.to_owned(),
            verify_saids: false,
        }
    }
}

/// CESR codec.
#[derive(Debug, Clone)]
pub struct Codec {
    config: CesrConfig,
    parser: Parser,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            parser: Parser::new(ParserConfig::default()),
            config: CesrConfig::default(),
        }
    }
}

impl Codec {
    /// Create a codec, rejecting digest codes it cannot compute.
    pub fn new(config: CesrConfig) -> Result<Self> {
        if !crypto::is_supported_digest(&config.digest_code) {
            return Err(CesrError::Config(format!(
                "unsupported digest code {}",
                config.digest_code
            )));
        }
        Ok(Self {
            parser: Parser::new(config.parser.clone()),
            config,
        })
    }

    pub fn config(&self) -> &CesrConfig {
        &self.config
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Body Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Serialize a field map, sizing its version string.
    ///
    /// The map's SAID field, if any, is serialized as given.
    pub fn serialize(&self, map: SadMap) -> Result<Sad> {
        Ok(Sad::from_map(map, self.config.kind)?)
    }

    /// Serialize a field map and embed its SAID.
    pub fn saidify(&self, map: SadMap) -> Result<Sad> {
        let sad = Sad::saidify(map, self.config.kind, &self.config.digest_code)?;
        tracing::trace!(
            said = sad.said().map(Matter::qb64),
            size = sad.size(),
            "saidified body"
        );
        Ok(sad)
    }

    /// Inflate a raw body, checking its SAID when configured to.
    ///
    /// Bodies without a SAID are accepted unchecked.
    pub fn deserialize(&self, raw: impl Into<Bytes>) -> Result<Sad> {
        let sad = Sad::from_raw(raw)?;
        if self.config.verify_saids && sad.said().is_some() {
            self.verify(&sad)?;
        }
        Ok(sad)
    }

    /// Recompute and compare the SAID of a body.
    pub fn verify(&self, sad: &Sad) -> Result<()> {
        sad.verify().map_err(|e| {
            tracing::warn!(error = %e, protocol = %sad.protocol(), "SAID verification failed");
            e.into()
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stream Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Lazily parse `stream`.
    ///
    /// The iterator yields at most one error and then stops, whether the
    /// message was malformed or its SAID did not verify.
    pub fn parse<'c>(
        &'c self,
        stream: impl Into<Bytes>,
    ) -> impl Iterator<Item = Result<Message>> + 'c {
        self.parser
            .messages(stream)
            .map(move |parsed| -> Result<Message> {
                let message = parsed?;
                if self.config.verify_saids {
                    let sad = message.body().sad()?;
                    if sad.said().is_some() {
                        self.verify(&sad)?;
                    }
                }
                Ok(message)
            })
            .scan(false, |failed, result| {
                if *failed {
                    return None;
                }
                *failed = result.is_err();
                Some(result)
            })
    }

    /// Parse every message of `stream`.
    pub fn parse_all(&self, stream: impl Into<Bytes>) -> Result<Vec<Message>> {
        self.parse(stream).collect()
    }

    /// Serialize messages back into a stream.
    pub fn pack(&self, messages: &[Message]) -> Bytes {
        cesr_parser::pack(messages)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signature Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify every controller indexed signature of `message` against
    /// `keys`, the signer's current key list.
    ///
    /// Returns the number of verified signatures.
    pub fn verify_signatures(&self, message: &Message, keys: &[Matter]) -> Result<usize> {
        let body = message.body().raw();
        let mut verified = 0;
        for siger in message.controller_sigers() {
            let index = siger.index();
            let key = keys
                .get(index as usize)
                .ok_or(ValidationError::IndexOutOfRange {
                    index,
                    keys: keys.len(),
                })?;
            crypto::verify_siger(key, body, &siger.indexer()?).map_err(|e| {
                tracing::warn!(index, key = key.qb64(), error = %e, "signature verification failed");
                CesrError::from(e)
            })?;
            verified += 1;
        }
        Ok(verified)
    }

    /// Verify the `(verfer, cigar)` couples of top-level `-C` groups.
    ///
    /// Returns the number of verified couples.
    pub fn verify_receipt_couples(&self, message: &Message) -> Result<usize> {
        let body = message.body().raw();
        let mut verified = 0;
        for group in message.groups(cesr_core::counter::codex::NON_TRANS_RECEIPT_COUPLES) {
            for couple in group.items().iter().filter_map(|item| item.as_tuple()) {
                let (verfer, cigar) = match couple {
                    [verfer, cigar] => (
                        couple_part(verfer, PrimitiveKind::Verfer)?,
                        couple_part(cigar, PrimitiveKind::Cigar)?,
                    ),
                    _ => {
                        return Err(ValidationError::StructuralError(
                            "receipt couple must hold two primitives".into(),
                        )
                        .into())
                    }
                };
                crypto::verify_cigar(&verfer, body, &cigar).map_err(|e| {
                    tracing::warn!(verfer = verfer.qb64(), error = %e, "receipt verification failed");
                    CesrError::from(e)
                })?;
                verified += 1;
            }
        }
        Ok(verified)
    }
}

fn couple_part(item: &cesr_parser::Item, kind: PrimitiveKind) -> Result<Matter> {
    match item.as_primitive() {
        Some(p) if p.kind() == kind => Ok(p.matter()?),
        _ => Err(ValidationError::StructuralError(format!("expected {kind:?} in receipt couple")).into()),
    }
}

//! # CESR
//!
//! Composable Event Streaming Representation for KERI and ACDC.
//!
//! ## Overview
//!
//! This crate provides a single [`Codec`] over:
//!
//! - **Primitives**: self-framing derivation-coded keys, digests and signatures
//! - **Bodies**: JSON, CBOR and MessagePack field maps with a sized version
//!   string and an embedded self-addressing identifier (SAID)
//! - **Streams**: bodies followed by counted attachment groups, parsed
//!   lazily and re-serialized byte for byte
//! - **Signatures**: Ed25519 checks of indexed and non-indexed signatures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cesr::{Codec, CesrConfig};
//!
//! fn example(stream: Vec<u8>) -> cesr::Result<()> {
//!     let codec = Codec::new(CesrConfig::default())?;
//!
//!     let messages = codec.parse_all(stream.clone())?;
//!     for message in &messages {
//!         let event = message.body().keri_event()?;
//!         println!("{} at sn {}", event.ilk()?, event.sn()?);
//!     }
//!
//!     assert_eq!(codec.pack(&messages), stream);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `cesr::core` - Primitive codec, count codes, version strings, SADs
//! - `cesr::parser` - Stream parser and incremental buffer

pub mod codec;
pub mod error;

// Re-export component crates
pub use cesr_core as core;
pub use cesr_parser as parser;

pub use codec::{CesrConfig, Codec};
pub use error::{CesrError, Result};

// Re-export commonly used types
pub use cesr_core::{
    Counter, Credential, Indexer, KeriEvent, Kind, Matter, Protocol, Sad, SadMap, VersionString,
};
pub use cesr_parser::{Group, Item, Message, MessageBuffer, Parser, ParserConfig};

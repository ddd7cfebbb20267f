//! # CESR Core
//!
//! Pure primitives for CESR (Composable Event Streaming Representation):
//! derivation codes, count codes, version strings and self-addressing data.
//!
//! This crate contains no I/O. Every type here is a value computed from
//! bytes the caller already holds.
//!
//! ## Key Types
//!
//! - [`Matter`] - A self-framing primitive (key, digest, signature, number, path)
//! - [`Indexer`] - An indexed signature carrying its key offset
//! - [`Counter`] - A count code framing a group of attachments
//! - [`VersionString`] - Protocol, kind and size header of a body
//! - [`Sad`] - Self-addressing data with embedded size and SAID
//! - [`KeriEvent`] / [`Credential`] - Protocol-restricted views of a [`Sad`]
//!
//! ## Domains
//!
//! Every code reads the same in text (qb64) and binary (qb2). See [`cold`]
//! for how a parser tells them apart from a single byte.

pub mod b64;
pub mod cold;
pub mod counter;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod event;
pub mod indexer;
pub mod matter;
pub mod sad;
pub mod version;

pub use cold::{sniff, Cold, Domain};
pub use counter::{CountUnit, Counter, CounterSpec};
pub use credential::Credential;
pub use error::{CodeTable, CoreError, ValidationError};
pub use event::{Ilk, KeriEvent};
pub use indexer::Indexer;
pub use matter::Matter;
pub use sad::{Sad, SadMap};
pub use version::{Kind, Protocol, Version, VersionString};

//! # CESR Testkit
//!
//! Testing utilities for the CESR crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: a keripy key event log with its expected sizes,
//!   SAIDs and signing keys
//! - **Generators**: Proptest strategies for primitives, field maps and
//!   signed event logs
//! - **Fixtures**: deterministic signers and a key event log builder
//!
//! ## Golden Vectors
//!
//! ```rust
//! use cesr_parser::Parser;
//! use cesr_testkit::vectors::{KERIPY_EVENTS, KERIPY_KEL};
//!
//! let messages = Parser::default().parse_all(KERIPY_KEL).unwrap();
//! assert_eq!(messages.len(), KERIPY_EVENTS.len());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use cesr_testkit::generators::kel;
//!
//! proptest! {
//!     #[test]
//!     fn stream_repacks(kel in kel(6)) {
//!         let messages = Parser::default().parse_all(kel.stream().to_vec()).unwrap();
//!         prop_assert_eq!(cesr_parser::pack(&messages), kel.stream());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cesr_core::Kind;
//! use cesr_testkit::fixtures::KelBuilder;
//!
//! let mut kel = KelBuilder::incept(Kind::Json, 7);
//! kel.rotate();
//! assert_eq!(kel.events().len(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{KelBuilder, Signer};
pub use generators::{fixed_matter, kel, sad_map, variable_matter};
pub use vectors::{signing_keys, GoldenEvent, KERIPY_EVENTS, KERIPY_KEL, KERIPY_KEL_LEN};

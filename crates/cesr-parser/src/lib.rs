//! # CESR Parser
//!
//! Splits a CESR stream into messages: a serialized body followed by
//! counted attachment groups.
//!
//! ## Overview
//!
//! The parser walks a shared [`bytes::Bytes`] buffer with a [`Cursor`].
//! Bodies, count tokens and primitives are all zero-copy slices of that
//! buffer, so re-encoding a [`Message`] reproduces its input exactly.
//!
//! ## Key Properties
//!
//! - **Atomic**: a failed parse leaves the cursor where the message began
//! - **Lazy**: [`Parser::messages`] parses one message per `next()`
//! - **Mixed domain**: each top-level attachment group may be text or binary
//! - **Bounded**: nesting depth and buffered bytes are capped by [`ParserConfig`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cesr_parser::Parser;
//!
//! fn example(stream: Vec<u8>) -> Result<(), cesr_parser::ParseError> {
//!     let parser = Parser::default();
//!     for message in parser.messages(stream) {
//!         let message = message?;
//!         println!(
//!             "{} body, {} signatures",
//!             message.body().protocol(),
//!             message.controller_sigers().count()
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod cursor;
pub mod error;
mod groups;
pub mod message;
pub mod parser;

pub use buffer::MessageBuffer;
pub use cursor::Cursor;
pub use error::{ParseError, Result};
pub use message::{pack, Body, Group, IndexedPrimitive, Item, Message, Primitive, PrimitiveKind};
pub use parser::{Messages, Parser, ParserConfig};

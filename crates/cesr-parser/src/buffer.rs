//! Incremental message extraction from chunked input.
//!
//! Bytes arrive in arbitrary chunks. Complete messages are handed out as
//! soon as the start of the following message is buffered; the last message
//! is held back until more input or [`MessageBuffer::flush`] shows that its
//! attachments are complete.
//!
//! ```ignore
//! use cesr_parser::{MessageBuffer, ParserConfig};
//!
//! let mut buffer = MessageBuffer::new(ParserConfig::default());
//! for chunk in chunks {
//!     for message in buffer.push(&chunk)? {
//!         println!("{:?}", message.body().version_string());
//!     }
//! }
//! let tail = buffer.flush()?;
//! ```

use bytes::{Bytes, BytesMut};
use cesr_core::VersionString;

use crate::cursor::Cursor;
use crate::error::{ParseError, Result};
use crate::message::Message;
use crate::parser::{Parser, ParserConfig};

/// Buffer for accumulating stream bytes and extracting complete messages.
#[derive(Debug)]
pub struct MessageBuffer {
    /// Bytes not yet handed out as messages.
    buffer: BytesMut,
    parser: Parser,
}

impl MessageBuffer {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            parser: Parser::new(config),
        }
    }

    /// Buffered byte count.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered, e.g. after an unrecoverable error.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Append `data` and extract every message known to be complete.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BufferFull`] without buffering `data` if the
    /// limit would be exceeded. A malformed message is reported once no
    /// earlier message from the same call is pending; its bytes stay
    /// buffered until [`MessageBuffer::clear`].
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>> {
        let size = self.buffer.len() + data.len();
        let limit = self.parser.config().max_buffer_size;
        if size > limit {
            return Err(ParseError::BufferFull { size, limit });
        }
        self.buffer.extend_from_slice(data);
        self.drain(false)
    }

    /// Extract the remaining messages, treating the input as finished.
    ///
    /// A truncated trailing message is an error.
    pub fn flush(&mut self) -> Result<Vec<Message>> {
        self.drain(true)
    }

    fn drain(&mut self, at_end: bool) -> Result<Vec<Message>> {
        let stream: Bytes = self.buffer.split().freeze();
        let mut cursor = Cursor::new(stream.clone());
        let mut consumed = 0;
        let mut messages = Vec::new();
        let mut failure = None;

        loop {
            match self.parser.next_message(&mut cursor) {
                Ok(None) => break,
                // Attachments for the last message may still be in flight.
                Ok(Some(_)) if cursor.is_empty() && !at_end => break,
                Ok(Some(message)) => {
                    consumed = cursor.position();
                    messages.push(message);
                }
                Err(e) if !at_end && awaits_more(&e, cursor.remaining()) => break,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        self.buffer.extend_from_slice(&stream[consumed..]);
        tracing::trace!(
            emitted = messages.len(),
            buffered = self.buffer.len(),
            "drained message buffer"
        );

        match failure {
            Some(e) if messages.is_empty() => {
                tracing::warn!(error = %e, buffered = self.buffer.len(), "buffered stream is malformed");
                Err(e)
            }
            _ => Ok(messages),
        }
    }
}

/// Whether `err` could clear once more bytes follow `rest`.
fn awaits_more(err: &ParseError, rest: &[u8]) -> bool {
    match err {
        ParseError::MissingAttachments { .. } => {
            VersionString::sniff(rest).is_ok_and(|(vs, _)| vs.size == rest.len())
        }
        other => other.is_incomplete(),
    }
}

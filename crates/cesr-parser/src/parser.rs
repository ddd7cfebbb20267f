//! Stream parser state machine.
//!
//! A message is read in four steps: the cold start byte must announce a
//! body, the body's version string gives its size, the byte after the body
//! selects the attachment domain, and count codes are dispatched until the
//! next message starts or the stream ends. A failed attempt leaves the
//! cursor where it was.

use std::iter::FusedIterator;

use bytes::Bytes;
use cesr_core::{Cold, VersionString};
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::{ParseError, Result};
use crate::groups::decode_group;
use crate::message::{Body, Group, Message};

/// Configuration for parsing behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reject bodies that are not followed by at least one group.
    pub require_attachments: bool,
    /// Decode the groups inside `-V`/`-0V` blocks instead of keeping them opaque.
    pub decode_pipelined: bool,
    /// Deepest allowed group nesting; top-level groups sit at depth 0.
    pub max_depth: usize,
    /// Limit on bytes held by a [`MessageBuffer`](crate::MessageBuffer).
    pub max_buffer_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            require_attachments: true,
            decode_pipelined: true,
            max_depth: 8,
            max_buffer_size: 16 * 1024 * 1024,
        }
    }
}

/// CESR stream parser.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Lazily parse the messages in `stream`.
    ///
    /// The iterator yields at most one error and then stops.
    pub fn messages(&self, stream: impl Into<Bytes>) -> Messages<'_> {
        Messages {
            parser: self,
            cursor: Cursor::new(stream),
            done: false,
        }
    }

    /// Parse every message in `stream`.
    pub fn parse_all(&self, stream: impl Into<Bytes>) -> Result<Vec<Message>> {
        self.messages(stream).collect()
    }

    /// Parse the next message at the cursor.
    ///
    /// Returns `Ok(None)` at the end of the stream. On error the cursor is
    /// not advanced.
    pub fn next_message(&self, cursor: &mut Cursor) -> Result<Option<Message>> {
        if cursor.is_empty() {
            return Ok(None);
        }
        let mut attempt = cursor.clone();
        let message = self.extract(&mut attempt).map_err(|e| {
            tracing::debug!(offset = cursor.position(), error = %e, "parse attempt aborted");
            e
        })?;
        *cursor = attempt;
        Ok(Some(message))
    }

    /// Decode attachment groups until the next message or the end of input.
    pub fn parse_attachments(&self, cursor: &mut Cursor) -> Result<Vec<Group>> {
        let mut attempt = cursor.clone();
        let mut groups = Vec::new();
        while !attempt.is_empty() {
            let Some(domain) = attempt.sniff()?.domain() else {
                break;
            };
            groups.push(decode_group(&mut attempt, domain, &self.config, 0)?);
        }
        *cursor = attempt;
        Ok(groups)
    }

    fn extract(&self, cursor: &mut Cursor) -> Result<Message> {
        let offset = cursor.position();
        match cursor.sniff()? {
            Cold::Msg => {}
            found => return Err(ParseError::UnexpectedCold { found, offset }),
        }

        let (version, _) = VersionString::sniff(cursor.remaining())?;
        let raw = cursor.take(version.size)?;
        tracing::trace!(
            offset,
            protocol = %version.protocol,
            kind = %version.kind,
            size = version.size,
            "extracted body"
        );

        let attachments = self.parse_attachments(cursor)?;
        if attachments.is_empty() && self.config.require_attachments {
            return Err(ParseError::MissingAttachments { offset });
        }
        tracing::debug!(offset, groups = attachments.len(), "parsed message");

        Ok(Message::new(Body::new(raw, version), attachments))
    }
}

/// Iterator over the messages of a stream.
///
/// Stops after the first error; the error leaves [`Messages::position`] at
/// the start of the message that failed.
#[derive(Debug)]
pub struct Messages<'p> {
    parser: &'p Parser,
    cursor: Cursor,
    done: bool,
}

impl Messages<'_> {
    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn remaining(&self) -> &[u8] {
        self.cursor.remaining()
    }
}

impl Iterator for Messages<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parser.next_message(&mut self.cursor) {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                tracing::warn!(offset = self.cursor.position(), error = %e, "stream parse failed");
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Messages<'_> {}

//! Parsed messages and their attachment groups.
//!
//! Every node keeps the exact bytes it was parsed from, so re-encoding a
//! message is a concatenation and reproduces the input byte for byte.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use cesr_core::counter::codex;
use cesr_core::{
    CoreError, Credential, Domain, Indexer, KeriEvent, Kind, Matter, Protocol, Sad,
    VersionString,
};

/// Role of a primitive inside an attachment group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Public verification key.
    Verfer,
    /// Non-indexed signature.
    Cigar,
    /// Identifier prefix.
    Prefixer,
    /// Sequence number.
    Seqner,
    /// Event digest.
    Saider,
    /// ISO-8601 datetime.
    Dater,
    /// SAD path.
    Pather,
    /// Opaque block of counted quadlets.
    Material,
}

/// A primitive carved from the stream.
#[derive(Clone, PartialEq, Eq)]
pub struct Primitive {
    kind: PrimitiveKind,
    domain: Domain,
    bytes: Bytes,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind, domain: Domain, bytes: Bytes) -> Self {
        Self {
            kind,
            domain,
            bytes,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// The exact stream bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Decode into a validated primitive.
    pub fn matter(&self) -> Result<Matter, CoreError> {
        Matter::from_stream(&self.bytes, self.domain)
    }

    /// Text form of the stream bytes.
    pub fn qb64(&self) -> Result<String, CoreError> {
        self.domain.to_text(&self.bytes)
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.domain {
            Domain::Text => write!(
                f,
                "{:?}({})",
                self.kind,
                String::from_utf8_lossy(&self.bytes)
            ),
            Domain::Binary => write!(f, "{:?}(0x{})", self.kind, hex::encode(&self.bytes)),
        }
    }
}

/// An indexed signature carved from the stream.
#[derive(Clone, PartialEq, Eq)]
pub struct IndexedPrimitive {
    domain: Domain,
    bytes: Bytes,
    index: u32,
    ondex: Option<u32>,
}

impl IndexedPrimitive {
    pub fn new(domain: Domain, bytes: Bytes, index: u32, ondex: Option<u32>) -> Self {
        Self {
            domain,
            bytes,
            index,
            ondex,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Offset of the signing key in the current key list.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn ondex(&self) -> Option<u32> {
        self.ondex
    }

    pub fn indexer(&self) -> Result<Indexer, CoreError> {
        Indexer::from_stream(&self.bytes, self.domain)
    }
}

impl fmt::Debug for IndexedPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Siger(index={}, {} bytes)", self.index, self.bytes.len())
    }
}

/// One element of an attachment group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Primitive(Primitive),
    Indexed(IndexedPrimitive),
    /// Fixed-arity sequence with no framing of its own.
    Tuple(Vec<Item>),
    Group(Group),
}

impl Item {
    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Item::Primitive(p) => p.bytes.len(),
            Item::Indexed(i) => i.bytes.len(),
            Item::Tuple(items) => items.iter().map(Item::encoded_len).sum(),
            Item::Group(g) => g.encoded_len(),
        }
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        match self {
            Item::Primitive(p) => dst.put_slice(&p.bytes),
            Item::Indexed(i) => dst.put_slice(&i.bytes),
            Item::Tuple(items) => items.iter().for_each(|item| item.encode(dst)),
            Item::Group(g) => g.encode(dst),
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Item::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_indexed(&self) -> Option<&IndexedPrimitive> {
        match self {
            Item::Indexed(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Item]> {
        match self {
            Item::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Item::Group(g) => Some(g),
            _ => None,
        }
    }
}

/// A counted attachment group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    code: &'static str,
    count: u64,
    domain: Domain,
    token: Bytes,
    path: Option<Primitive>,
    items: Vec<Item>,
}

impl Group {
    pub(crate) fn new(
        code: &'static str,
        count: u64,
        domain: Domain,
        token: Bytes,
        path: Option<Primitive>,
        items: Vec<Item>,
    ) -> Self {
        Self {
            code,
            count,
            domain,
            token,
            path,
            items,
        }
    }

    /// Count code of the group.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Count carried by the token: items, or quadlets for opaque blocks.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// The exact count token bytes.
    pub fn token(&self) -> &Bytes {
        &self.token
    }

    /// Scoping path of a root SAD path group.
    pub fn path(&self) -> Option<&Primitive> {
        self.path.as_ref()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Indexed signatures directly inside this group.
    pub fn sigers(&self) -> impl Iterator<Item = &IndexedPrimitive> {
        self.items.iter().filter_map(Item::as_indexed)
    }

    pub fn encoded_len(&self) -> usize {
        self.token.len()
            + self.path.as_ref().map_or(0, |p| p.bytes.len())
            + self.items.iter().map(Item::encoded_len).sum::<usize>()
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.token);
        if let Some(path) = &self.path {
            dst.put_slice(&path.bytes);
        }
        for item in &self.items {
            item.encode(dst);
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// The serialized body of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    raw: Bytes,
    version: VersionString,
}

impl Body {
    pub(crate) fn new(raw: Bytes, version: VersionString) -> Self {
        Self { raw, version }
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn version_string(&self) -> VersionString {
        self.version
    }

    pub fn protocol(&self) -> Protocol {
        self.version.protocol
    }

    pub fn kind(&self) -> Kind {
        self.version.kind
    }

    /// Inflate into a field map. The SAID is not verified.
    pub fn sad(&self) -> Result<Sad, CoreError> {
        Sad::from_raw(self.raw.clone())
    }

    pub fn keri_event(&self) -> Result<KeriEvent, CoreError> {
        KeriEvent::from_raw(self.raw.clone())
    }

    pub fn credential(&self) -> Result<Credential, CoreError> {
        Credential::from_raw(self.raw.clone())
    }
}

/// A body with its attachment groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    body: Body,
    attachments: Vec<Group>,
}

impl Message {
    pub fn new(body: Body, attachments: Vec<Group>) -> Self {
        Self { body, attachments }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn attachments(&self) -> &[Group] {
        &self.attachments
    }

    /// Top-level groups with the given count code.
    pub fn groups<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Group> + 'a {
        self.attachments.iter().filter(move |g| g.code == code)
    }

    /// Controller indexed signatures from top-level `-A` groups.
    pub fn controller_sigers(&self) -> impl Iterator<Item = &IndexedPrimitive> {
        self.groups(codex::CONTROLLER_IDX_SIGS)
            .flat_map(|group| group.sigers())
    }

    pub fn encoded_len(&self) -> usize {
        self.body.raw.len() + self.attachments.iter().map(Group::encoded_len).sum::<usize>()
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.body.raw);
        for group in &self.attachments {
            group.encode(dst);
        }
    }

    /// Re-serialize: body bytes then each group in order.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Concatenate the serializations of several messages.
pub fn pack<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Bytes {
    let mut buf = BytesMut::new();
    for message in messages {
        message.encode(&mut buf);
    }
    buf.freeze()
}

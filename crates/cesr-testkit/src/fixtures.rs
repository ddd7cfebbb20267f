//! Test fixtures and helpers.
//!
//! Deterministic signers and a key event log builder that emits signed
//! CESR streams.

use std::fmt;

use cesr_core::{crypto, indexer, matter, Indexer, KeriEvent, Kind, Matter, SadMap};
use ed25519_dalek::{Signer as _, SigningKey};
use serde_json::{json, Value};

/// An Ed25519 key pair that signs in CESR form.
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    /// Create a signer with a random key.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Create a deterministic signer from a seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Transferable verification key (`D`).
    pub fn verfer(&self) -> Matter {
        Matter::from_raw(matter::codex::ED25519, self.key.verifying_key().as_bytes())
            .expect("ed25519 key has fixed size")
    }

    /// Non-indexed signature (`0B`).
    pub fn sign(&self, message: &[u8]) -> Matter {
        let sig = self.key.sign(message);
        Matter::from_raw(matter::codex::ED25519_SIG, &sig.to_bytes())
            .expect("ed25519 signature has fixed size")
    }

    /// Indexed signature, switching to the big code past index 63.
    pub fn sign_indexed(&self, message: &[u8], index: u32) -> Indexer {
        let code = if index < 64 {
            indexer::codex::ED25519_SIG
        } else {
            indexer::codex::ED25519_BIG_SIG
        };
        let sig = self.key.sign(message);
        Indexer::from_raw(code, &sig.to_bytes(), index, None).expect("index fits the code")
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({})", self.verfer())
    }
}

/// Builds a single-signature key event log and its CESR stream.
///
/// Events use a basic prefix and are each followed by a text `-A` group
/// holding one controller signature.
pub struct KelBuilder {
    kind: Kind,
    seed: u8,
    current: Signer,
    next: Signer,
    prefix: String,
    events: Vec<KeriEvent>,
    keys: Vec<Vec<Matter>>,
    stream: Vec<u8>,
}

impl KelBuilder {
    /// Start a log with an inception event.
    pub fn incept(kind: Kind, seed: u8) -> Self {
        let current = Signer::from_seed([seed; 32]);
        let next = Signer::from_seed([seed.wrapping_add(1); 32]);
        let prefix = current.verfer().qb64().to_owned();
        let mut builder = Self {
            kind,
            seed: seed.wrapping_add(1),
            current,
            next,
            prefix,
            events: Vec::new(),
            keys: Vec::new(),
            stream: Vec::new(),
        };

        let fields = json!({
            "v": builder.version(),
            "t": "icp",
            "d": "",
            "i": builder.prefix,
            "s": "0",
            "kt": "1",
            "k": [builder.current.verfer().qb64()],
            "nt": "1",
            "n": [builder.next_digest()],
            "bt": "0",
            "b": [],
            "c": [],
            "a": []
        });
        builder.append(fields);
        builder
    }

    /// Rotate to the pre-committed next key.
    pub fn rotate(&mut self) -> &KeriEvent {
        self.seed = self.seed.wrapping_add(1);
        let upcoming = Signer::from_seed([self.seed; 32]);
        self.current = std::mem::replace(&mut self.next, upcoming);

        let fields = json!({
            "v": self.version(),
            "t": "rot",
            "d": "",
            "i": self.prefix,
            "s": self.next_sn(),
            "p": self.prior(),
            "kt": "1",
            "k": [self.current.verfer().qb64()],
            "nt": "1",
            "n": [self.next_digest()],
            "bt": "0",
            "br": [],
            "ba": [],
            "a": []
        });
        self.append(fields)
    }

    /// Append an interaction event anchoring `seals`.
    pub fn interact(&mut self, seals: Vec<Value>) -> &KeriEvent {
        let fields = json!({
            "v": self.version(),
            "t": "ixn",
            "d": "",
            "i": self.prefix,
            "s": self.next_sn(),
            "p": self.prior(),
            "a": seals
        });
        self.append(fields)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn events(&self) -> &[KeriEvent] {
        &self.events
    }

    /// Signing keys in force for each event.
    pub fn keys(&self) -> &[Vec<Matter>] {
        &self.keys
    }

    /// The signed stream so far.
    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    fn version(&self) -> String {
        format!("KERI10{}000000_", self.kind)
    }

    fn next_sn(&self) -> String {
        format!("{:x}", self.events.len())
    }

    fn prior(&self) -> String {
        self.events
            .last()
            .and_then(|event| event.sad().said())
            .map(|said| said.qb64().to_owned())
            .unwrap_or_default()
    }

    fn next_digest(&self) -> String {
        crypto::digest(matter::codex::BLAKE3_256, self.next.verfer().qb64b())
            .expect("blake3 is supported")
            .qb64()
            .to_owned()
    }

    fn append(&mut self, fields: Value) -> &KeriEvent {
        let map: SadMap = match fields {
            Value::Object(map) => map,
            _ => unreachable!("event fields are an object"),
        };
        let event = KeriEvent::saidify(map, Some(self.kind), matter::codex::BLAKE3_256)
            .expect("event fields are well formed");
        let siger = self.current.sign_indexed(event.raw(), 0);

        self.stream.extend_from_slice(event.raw());
        self.stream.extend_from_slice(b"-AAB");
        self.stream.extend_from_slice(siger.qb64b());
        self.keys.push(vec![self.current.verfer()]);
        self.events.push(event);
        self.events.last().expect("event was just pushed")
    }
}

impl fmt::Debug for KelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KelBuilder")
            .field("kind", &self.kind)
            .field("prefix", &self.prefix)
            .field("events", &self.events.len())
            .field("stream_len", &self.stream.len())
            .finish()
    }
}

//! Self-addressing data.
//!
//! A SAD is a field map whose serialization embeds both its own size (in
//! the version string, field `v`) and a digest of itself (the SAID, field
//! `d`). Raw bytes, field map, version and SAID are all derived from one
//! canonical raw buffer so they cannot drift apart.
//!
//! Sizing is two-pass: serialize with a placeholder size, measure, patch
//! the version string, serialize again. The version string has a fixed
//! width so the second pass never changes the length. The SAID is computed
//! the same way over a serialization whose `d` holds `#` repeated to the
//! full size of the digest code.

use bytes::Bytes;
use serde_json::Value;

use crate::cold::{self, Cold};
use crate::crypto;
use crate::error::{CoreError, ValidationError};
use crate::matter::{sizage, Matter};
use crate::version::{Kind, Protocol, Version, VersionString};

/// Ordered field map of a SAD.
pub type SadMap = serde_json::Map<String, Value>;

/// Reserved field labels.
pub mod labels {
    pub const VERSION: &str = "v";
    pub const SAID: &str = "d";
}

/// Placeholder character filling the SAID field while digesting.
pub const DUMMY: char = '#';

/// Serialize a field map.
pub fn dumps(map: &SadMap, kind: Kind) -> Result<Vec<u8>, CoreError> {
    let encoding = |e: String| CoreError::EncodingError(e);
    match kind {
        Kind::Json => serde_json::to_vec(map).map_err(|e| encoding(e.to_string())),
        Kind::Cbor => {
            let mut buf = Vec::new();
            ciborium::ser::into_writer(map, &mut buf).map_err(|e| encoding(e.to_string()))?;
            Ok(buf)
        }
        Kind::Mgpk => rmp_serde::to_vec(map).map_err(|e| encoding(e.to_string())),
    }
}

/// Deserialize a field map.
pub fn loads(raw: &[u8], kind: Kind) -> Result<SadMap, CoreError> {
    let decoding = |e: String| CoreError::DecodingError(e);
    match kind {
        Kind::Json => serde_json::from_slice(raw).map_err(|e| decoding(e.to_string())),
        Kind::Cbor => ciborium::de::from_reader(raw).map_err(|e| decoding(e.to_string())),
        Kind::Mgpk => rmp_serde::from_slice(raw).map_err(|e| decoding(e.to_string())),
    }
}

/// A sized, serialized SAD.
#[derive(Debug, Clone, PartialEq)]
pub struct Sad {
    raw: Bytes,
    map: SadMap,
    version: VersionString,
    said: Option<Matter>,
}

impl Sad {
    /// Inflate the body at the start of `raw`.
    ///
    /// Bytes past the size announced by the version string are ignored.
    /// The SAID is extracted but not verified; see [`Sad::verify`].
    pub fn from_raw(raw: impl Into<Bytes>) -> Result<Self, CoreError> {
        let raw: Bytes = raw.into();
        match cold::sniff(&raw)? {
            Cold::Msg => {}
            found => {
                return Err(CoreError::UnexpectedCold {
                    expected: Cold::Msg,
                    found,
                })
            }
        }

        let (version, _) = VersionString::sniff(&raw)?;
        check_version(version.version)?;
        if raw.len() < version.size {
            return Err(CoreError::InsufficientBytes {
                needed: version.size,
                available: raw.len(),
            });
        }

        let raw = raw.slice(..version.size);
        let map = loads(&raw, version.kind)?;
        let said = extract_said(&map)?;
        Ok(Self {
            raw,
            map,
            version,
            said,
        })
    }

    /// Serialize a field map, patching the size into its version string.
    ///
    /// `kind` overrides the serialization named by the map's `v` field.
    pub fn from_map(mut map: SadMap, kind: Option<Kind>) -> Result<Self, CoreError> {
        let (raw, version) = sizeify(&mut map, kind)?;
        let said = extract_said(&map)?;
        Ok(Self {
            raw: Bytes::from(raw),
            map,
            version,
            said,
        })
    }

    /// Compute and embed the SAID of a field map under digest `code`.
    pub fn saidify(mut map: SadMap, kind: Option<Kind>, code: &str) -> Result<Self, CoreError> {
        if !map.contains_key(labels::SAID) {
            return Err(CoreError::MissingField(labels::SAID));
        }
        map.insert(labels::SAID.to_owned(), Value::String(dummy(code)?));
        let (raw, version) = sizeify(&mut map, kind)?;
        let said = crypto::digest(code, &raw)?;
        map.insert(labels::SAID.to_owned(), Value::String(said.qb64().to_owned()));
        let raw = dumps(&map, version.kind)?;
        Ok(Self {
            raw: Bytes::from(raw),
            map,
            version,
            said: Some(said),
        })
    }

    /// Recompute the SAID and compare it with the embedded one.
    ///
    /// Every top-level field holding the SAID is replaced by the placeholder,
    /// which covers self-addressing identifiers that repeat it.
    pub fn verify(&self) -> Result<(), ValidationError> {
        let said = self.said.as_ref().ok_or(ValidationError::MissingSaid)?;
        let computed = compute_said(&self.map, self.version.kind, said)?;
        if computed.qb64() != said.qb64() {
            return Err(ValidationError::SaidMismatch {
                expected: said.qb64().to_owned(),
                computed: computed.qb64().to_owned(),
            });
        }
        Ok(())
    }

    /// Canonical raw serialization.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn map(&self) -> &SadMap {
        &self.map
    }

    pub fn into_map(self) -> SadMap {
        self.map
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.map.get(label)
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

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.version.size
    }

    /// The embedded SAID, if any.
    pub fn said(&self) -> Option<&Matter> {
        self.said.as_ref()
    }

    /// Pretty JSON rendering of the field map.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.map).unwrap_or_default()
    }

    /// A required string field.
    pub fn str_field(&self, label: &'static str) -> Result<&str, CoreError> {
        match self.map.get(label) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(CoreError::MalformedField {
                field: label,
                reason: "not a string".into(),
            }),
            None => Err(CoreError::MissingField(label)),
        }
    }

    /// A required field holding one primitive.
    pub fn matter_field(&self, label: &'static str) -> Result<Matter, CoreError> {
        Matter::from_qb64(self.str_field(label)?)
    }

    /// A required field holding a list of primitives.
    pub fn matter_list(&self, label: &'static str) -> Result<Vec<Matter>, CoreError> {
        let items = match self.map.get(label) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(CoreError::MalformedField {
                    field: label,
                    reason: "not a list".into(),
                })
            }
            None => return Err(CoreError::MissingField(label)),
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Matter::from_qb64(s),
                _ => Err(CoreError::MalformedField {
                    field: label,
                    reason: "list item is not a string".into(),
                }),
            })
            .collect()
    }

    /// Fail unless this body belongs to `expected`.
    pub(crate) fn expect_protocol(self, expected: Protocol) -> Result<Self, CoreError> {
        if self.protocol() != expected {
            return Err(CoreError::UnexpectedProtocol {
                expected,
                got: self.protocol(),
            });
        }
        Ok(self)
    }
}

fn check_version(version: Version) -> Result<(), CoreError> {
    if version != Version::V1_0 {
        return Err(CoreError::UnsupportedVersion {
            major: version.major,
            minor: version.minor,
        });
    }
    Ok(())
}

fn dummy(code: &str) -> Result<String, CoreError> {
    if !crypto::is_supported_digest(code) {
        return Err(CoreError::UnsupportedDigest(code.to_owned()));
    }
    let fs = sizage(code)
        .and_then(|s| s.fs)
        .ok_or_else(|| CoreError::UnsupportedDigest(code.to_owned()))?;
    Ok(DUMMY.to_string().repeat(fs))
}

fn extract_said(map: &SadMap) -> Result<Option<Matter>, CoreError> {
    match map.get(labels::SAID) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Matter::from_qb64(s).map(Some),
        Some(_) => Err(CoreError::MalformedField {
            field: labels::SAID,
            reason: "not a string".into(),
        }),
    }
}

/// Two-pass sizing of `map` in place. Returns the final serialization.
fn sizeify(map: &mut SadMap, kind: Option<Kind>) -> Result<(Vec<u8>, VersionString), CoreError> {
    let current = match map.iter().next() {
        Some((label, Value::String(vs))) if label == labels::VERSION => {
            VersionString::parse(vs.as_bytes())?
        }
        Some((label, _)) if label == labels::VERSION => {
            return Err(CoreError::MalformedField {
                field: labels::VERSION,
                reason: "not a string".into(),
            })
        }
        _ if map.contains_key(labels::VERSION) => {
            return Err(CoreError::MalformedField {
                field: labels::VERSION,
                reason: "must be the first field".into(),
            })
        }
        _ => return Err(CoreError::MissingField(labels::VERSION)),
    };
    check_version(current.version)?;

    let kind = kind.unwrap_or(current.kind);
    let version = VersionString::new(current.protocol, kind, 0)?;
    map.insert(labels::VERSION.to_owned(), Value::String(version.to_string()));
    let size = dumps(map, kind)?.len();

    let version = version.with_size(size)?;
    map.insert(labels::VERSION.to_owned(), Value::String(version.to_string()));
    let raw = dumps(map, kind)?;
    if raw.len() != size {
        return Err(CoreError::EncodingError(format!(
            "size changed from {size} to {} after patching version",
            raw.len()
        )));
    }
    Ok((raw, version))
}

fn compute_said(map: &SadMap, kind: Kind, said: &Matter) -> Result<Matter, CoreError> {
    let placeholder = dummy(said.code())?;
    let mut map = map.clone();
    for value in map.values_mut() {
        if matches!(value, Value::String(s) if s == said.qb64()) {
            *value = Value::String(placeholder.clone());
        }
    }
    crypto::digest(said.code(), &dumps(&map, kind)?)
}

//! Version strings.
//!
//! Every serialized body opens with a fixed-width version string such as
//! `KERI10JSON00012b_`: protocol, major and minor version, serialization
//! kind, body size in lowercase hex, and a `_` terminator. It must begin
//! within the first [`MAX_VERSION_OFFSET`] bytes so a parser can find it
//! without knowing the serialization in advance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Length of a version string.
pub const VERSION_SIZE: usize = 17;
/// Furthest byte offset at which a version string may start.
pub const MAX_VERSION_OFFSET: usize = 12;
/// Bytes needed to rule out a version string.
pub const MIN_SNIFF_SIZE: usize = MAX_VERSION_OFFSET + VERSION_SIZE;
/// Largest body size six hex digits can express.
pub const MAX_BODY_SIZE: usize = 0xff_ffff;

/// Protocol tag of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Keri,
    Acdc,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Keri => "KERI",
            Protocol::Acdc => "ACDC",
        }
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KERI" => Ok(Protocol::Keri),
            "ACDC" => Ok(Protocol::Acdc),
            other => Err(CoreError::UnknownProtocol(other.to_owned())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization kind of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Kind {
    Json,
    Cbor,
    Mgpk,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Json => "JSON",
            Kind::Cbor => "CBOR",
            Kind::Mgpk => "MGPK",
        }
    }
}

impl FromStr for Kind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(Kind::Json),
            "CBOR" => Ok(Kind::Cbor),
            "MGPK" => Ok(Kind::Mgpk),
            other => Err(CoreError::UnknownKind(other.to_owned())),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const V1_0: Version = Version { major: 1, minor: 0 };
}

/// A decoded version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionString {
    pub protocol: Protocol,
    pub version: Version,
    pub kind: Kind,
    pub size: usize,
}

impl VersionString {
    /// Version 1.0 string for a body of `size` bytes.
    pub fn new(protocol: Protocol, kind: Kind, size: usize) -> Result<Self, CoreError> {
        if size > MAX_BODY_SIZE {
            return Err(CoreError::SizeOverflow {
                size,
                max: MAX_BODY_SIZE,
            });
        }
        Ok(Self {
            protocol,
            version: Version::V1_0,
            kind,
            size,
        })
    }

    /// Same string with a different size.
    pub fn with_size(self, size: usize) -> Result<Self, CoreError> {
        let mut vs = Self::new(self.protocol, self.kind, size)?;
        vs.version = self.version;
        Ok(vs)
    }

    /// Decode exactly one version string.
    pub fn parse(text: &[u8]) -> Result<Self, CoreError> {
        if text.len() != VERSION_SIZE || !has_shape(text) {
            return Err(CoreError::InvalidVersionString(
                String::from_utf8_lossy(text).into_owned(),
            ));
        }
        // Shape check guarantees ASCII.
        let text = std::str::from_utf8(text)
            .map_err(|e| CoreError::InvalidVersionString(e.to_string()))?;
        let hex = |s: &str| {
            usize::from_str_radix(s, 16)
                .map_err(|e| CoreError::InvalidVersionString(e.to_string()))
        };
        Ok(Self {
            protocol: text[0..4].parse()?,
            version: Version {
                major: hex(&text[4..5])? as u8,
                minor: hex(&text[5..6])? as u8,
            },
            kind: text[6..10].parse()?,
            size: hex(&text[10..16])?,
        })
    }

    /// Locate and decode the version string of a body.
    ///
    /// Returns the version string and its byte offset. The announced size
    /// must cover the version string itself.
    pub fn sniff(raw: &[u8]) -> Result<(Self, usize), CoreError> {
        for offset in 0..=MAX_VERSION_OFFSET {
            let Some(window) = raw.get(offset..offset + VERSION_SIZE) else {
                break;
            };
            if has_shape(window) {
                let vs = Self::parse(window)?;
                if vs.size < offset + VERSION_SIZE {
                    return Err(CoreError::InvalidVersionString(format!(
                        "size {} ends before the version string at offset {offset}",
                        vs.size
                    )));
                }
                return Ok((vs, offset));
            }
        }
        if raw.len() < MIN_SNIFF_SIZE {
            return Err(CoreError::InsufficientBytes {
                needed: MIN_SNIFF_SIZE,
                available: raw.len(),
            });
        }
        Err(CoreError::MissingVersion(MAX_VERSION_OFFSET))
    }
}

fn has_shape(w: &[u8]) -> bool {
    let upper = |s: &[u8]| s.iter().all(u8::is_ascii_uppercase);
    let hex = |s: &[u8]| s.iter().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f'));
    w.len() == VERSION_SIZE
        && upper(&w[0..4])
        && hex(&w[4..6])
        && upper(&w[6..10])
        && hex(&w[10..16])
        && w[16] == b'_'
}

impl fmt::Display for VersionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:x}{:x}{}{:06x}_",
            self.protocol, self.version.major, self.version.minor, self.kind, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versify_round_trip() {
        let vs = VersionString::new(Protocol::Keri, Kind::Json, 0x12b).unwrap();
        assert_eq!(vs.to_string(), "KERI10JSON00012b_");
        assert_eq!(VersionString::parse(b"KERI10JSON00012b_").unwrap(), vs);

        let acdc = VersionString::new(Protocol::Acdc, Kind::Cbor, 0).unwrap();
        assert_eq!(acdc.to_string(), "ACDC10CBOR000000_");
    }

    #[test]
    fn test_size_overflow() {
        assert!(VersionString::new(Protocol::Keri, Kind::Json, MAX_BODY_SIZE).is_ok());
        assert!(matches!(
            VersionString::new(Protocol::Keri, Kind::Json, MAX_BODY_SIZE + 1),
            Err(CoreError::SizeOverflow { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in [
            &b"KERI10JSON00012B_"[..],
            b"KERI10JSON00012b-",
            b"keri10JSON00012b_",
            b"KERI10JSON00012b",
        ] {
            assert!(matches!(
                VersionString::parse(bad),
                Err(CoreError::InvalidVersionString(_))
            ));
        }
        assert!(matches!(
            VersionString::parse(b"XXXX10JSON00012b_"),
            Err(CoreError::UnknownProtocol(_))
        ));
        assert!(matches!(
            VersionString::parse(b"KERI10YAML00012b_"),
            Err(CoreError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_sniff_offsets() {
        let json = br#"{"v":"KERI10JSON00012b_","t":"icp"}"#;
        let (vs, offset) = VersionString::sniff(json).unwrap();
        assert_eq!(offset, 6);
        assert_eq!(vs.size, 0x12b);

        let mut at_twelve = vec![b' '; 12];
        at_twelve.extend_from_slice(b"KERI10JSON00012b_");
        assert_eq!(VersionString::sniff(&at_twelve).unwrap().1, 12);
    }

    #[test]
    fn test_sniff_rejects_late_version() {
        let mut late = vec![b' '; 13];
        late.extend_from_slice(b"KERI10JSON00012b_");
        assert_eq!(
            VersionString::sniff(&late),
            Err(CoreError::MissingVersion(MAX_VERSION_OFFSET))
        );
    }

    #[test]
    fn test_sniff_rejects_size_inside_version() {
        for body in [
            &br#"{"v":"KERI10JSON000000_","t":"icp"}"#[..],
            br#"{"v":"KERI10JSON000016_","t":"icp"}"#,
        ] {
            assert!(matches!(
                VersionString::sniff(body),
                Err(CoreError::InvalidVersionString(_))
            ));
        }
        let (vs, _) = VersionString::sniff(br#"{"v":"KERI10JSON000017_"}"#).unwrap();
        assert_eq!(vs.size, 0x17);
    }

    #[test]
    fn test_sniff_short_buffer() {
        assert!(VersionString::sniff(br#"{"v":"KERI10"#)
            .unwrap_err()
            .is_incomplete());
    }
}

//! KERI key events.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::CoreError;
use crate::matter::Matter;
use crate::sad::{Sad, SadMap};
use crate::version::{Kind, Protocol};

/// Message type of a KERI body (field `t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ilk {
    Icp,
    Rot,
    Ixn,
    Dip,
    Drt,
    Rct,
    Qry,
    Rpy,
    Pro,
    Bar,
    Exn,
    Vcp,
    Vrt,
    Iss,
    Rev,
    Bis,
    Brv,
}

impl Ilk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ilk::Icp => "icp",
            Ilk::Rot => "rot",
            Ilk::Ixn => "ixn",
            Ilk::Dip => "dip",
            Ilk::Drt => "drt",
            Ilk::Rct => "rct",
            Ilk::Qry => "qry",
            Ilk::Rpy => "rpy",
            Ilk::Pro => "pro",
            Ilk::Bar => "bar",
            Ilk::Exn => "exn",
            Ilk::Vcp => "vcp",
            Ilk::Vrt => "vrt",
            Ilk::Iss => "iss",
            Ilk::Rev => "rev",
            Ilk::Bis => "bis",
            Ilk::Brv => "brv",
        }
    }

    /// Inception and rotation events establish key state.
    pub fn is_establishment(&self) -> bool {
        matches!(self, Ilk::Icp | Ilk::Rot | Ilk::Dip | Ilk::Drt)
    }
}

impl FromStr for Ilk {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ilk = match s {
            "icp" => Ilk::Icp,
            "rot" => Ilk::Rot,
            "ixn" => Ilk::Ixn,
            "dip" => Ilk::Dip,
            "drt" => Ilk::Drt,
            "rct" => Ilk::Rct,
            "qry" => Ilk::Qry,
            "rpy" => Ilk::Rpy,
            "pro" => Ilk::Pro,
            "bar" => Ilk::Bar,
            "exn" => Ilk::Exn,
            "vcp" => Ilk::Vcp,
            "vrt" => Ilk::Vrt,
            "iss" => Ilk::Iss,
            "rev" => Ilk::Rev,
            "bis" => Ilk::Bis,
            "brv" => Ilk::Brv,
            other => {
                return Err(CoreError::MalformedField {
                    field: "t",
                    reason: format!("unknown ilk {other:?}"),
                })
            }
        };
        Ok(ilk)
    }
}

impl fmt::Display for Ilk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A KERI body. Construction fails for any other protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct KeriEvent {
    sad: Sad,
}

impl KeriEvent {
    pub fn from_sad(sad: Sad) -> Result<Self, CoreError> {
        Ok(Self {
            sad: sad.expect_protocol(Protocol::Keri)?,
        })
    }

    pub fn from_raw(raw: impl Into<Bytes>) -> Result<Self, CoreError> {
        Self::from_sad(Sad::from_raw(raw)?)
    }

    pub fn from_map(map: SadMap, kind: Option<Kind>) -> Result<Self, CoreError> {
        Self::from_sad(Sad::from_map(map, kind)?)
    }

    pub fn saidify(map: SadMap, kind: Option<Kind>, code: &str) -> Result<Self, CoreError> {
        Self::from_sad(Sad::saidify(map, kind, code)?)
    }

    pub fn sad(&self) -> &Sad {
        &self.sad
    }

    pub fn into_sad(self) -> Sad {
        self.sad
    }

    pub fn raw(&self) -> &Bytes {
        self.sad.raw()
    }

    pub fn ilk(&self) -> Result<Ilk, CoreError> {
        self.sad.str_field("t")?.parse()
    }

    /// Identifier prefix (field `i`).
    pub fn prefix(&self) -> Result<Matter, CoreError> {
        self.sad.matter_field("i")
    }

    /// Sequence number, hex encoded in field `s`.
    pub fn sn(&self) -> Result<u128, CoreError> {
        let s = self.sad.str_field("s")?;
        u128::from_str_radix(s, 16).map_err(|e| CoreError::MalformedField {
            field: "s",
            reason: e.to_string(),
        })
    }

    /// Digest of the prior event (field `p`), absent on inception.
    pub fn prior(&self) -> Result<Option<Matter>, CoreError> {
        match self.sad.get("p") {
            None => Ok(None),
            Some(_) => self.sad.matter_field("p").map(Some),
        }
    }

    /// Current signing keys (field `k`).
    pub fn keys(&self) -> Result<Vec<Matter>, CoreError> {
        self.sad.matter_list("k")
    }

    /// Next key digests (field `n`).
    pub fn next_digests(&self) -> Result<Vec<Matter>, CoreError> {
        self.sad.matter_list("n")
    }

    pub fn is_establishment(&self) -> bool {
        self.ilk().map(|ilk| ilk.is_establishment()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matter::codex;
    use serde_json::{json, Value};

    fn ixn_map() -> SadMap {
        match json!({
            "v": "KERI10JSON000000_",
            "t": "ixn",
            "d": "",
            "i": "DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx",
            "s": "1a",
            "p": "EIcca2-uqsicYK7-q5gxlZXuzOkqrNSL3JIaLflSOOgF",
            "a": [],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_accessors() {
        let event = KeriEvent::saidify(ixn_map(), None, codex::BLAKE3_256).unwrap();
        assert_eq!(event.ilk().unwrap(), Ilk::Ixn);
        assert_eq!(event.sn().unwrap(), 26);
        assert_eq!(event.prefix().unwrap().code(), codex::ED25519);
        assert_eq!(
            event.prior().unwrap().unwrap().qb64(),
            "EIcca2-uqsicYK7-q5gxlZXuzOkqrNSL3JIaLflSOOgF"
        );
        assert!(!event.is_establishment());
        assert_eq!(event.keys(), Err(CoreError::MissingField("k")));
        event.sad().verify().unwrap();
    }

    #[test]
    fn test_rejects_acdc() {
        let mut map = ixn_map();
        map.insert("v".into(), json!("ACDC10JSON000000_"));
        assert_eq!(
            KeriEvent::from_map(map, None),
            Err(CoreError::UnexpectedProtocol {
                expected: Protocol::Keri,
                got: Protocol::Acdc
            })
        );
    }

    #[test]
    fn test_ilk_parse() {
        assert_eq!("rot".parse::<Ilk>().unwrap(), Ilk::Rot);
        assert!(Ilk::Dip.is_establishment());
        assert!("xyz".parse::<Ilk>().is_err());
    }
}

//! ACDC credentials.

use bytes::Bytes;
use serde_json::Value;

use crate::error::CoreError;
use crate::matter::Matter;
use crate::sad::{Sad, SadMap};
use crate::version::{Kind, Protocol};

/// An ACDC body. Construction fails for any other protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    sad: Sad,
}

impl Credential {
    pub fn from_sad(sad: Sad) -> Result<Self, CoreError> {
        Ok(Self {
            sad: sad.expect_protocol(Protocol::Acdc)?,
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

    /// Issuer identifier (field `i`).
    pub fn issuer(&self) -> Result<Matter, CoreError> {
        self.sad.matter_field("i")
    }

    /// Schema SAID (field `s`).
    pub fn schema(&self) -> Result<Matter, CoreError> {
        self.sad.matter_field("s")
    }

    /// Registry identifier (field `ri`), if issued under one.
    pub fn registry(&self) -> Option<&str> {
        self.sad.get("ri").and_then(Value::as_str)
    }

    /// Attribute block (field `a`).
    pub fn attributes(&self) -> Option<&Value> {
        self.sad.get("a")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matter::codex;
    use serde_json::json;

    fn acdc_map(version: &str) -> SadMap {
        match json!({
            "v": version,
            "d": "",
            "i": "DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx",
            "ri": "EFXIx7URwmw7AVQTBcMxPXfOOJ2YYA1SJAam69DXV8D2",
            "s": "EIcca2-uqsicYK7-q5gxlZXuzOkqrNSL3JIaLflSOOgF",
            "a": {"LEI": "254900OPPU84GM83MG36"},
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_credential_accessors() {
        let cred = Credential::saidify(acdc_map("ACDC10JSON000000_"), None, codex::BLAKE3_256)
            .unwrap();
        assert_eq!(cred.issuer().unwrap().code(), codex::ED25519);
        assert!(cred.schema().unwrap().is_digest());
        assert_eq!(
            cred.registry(),
            Some("EFXIx7URwmw7AVQTBcMxPXfOOJ2YYA1SJAam69DXV8D2")
        );
        assert_eq!(cred.attributes().unwrap()["LEI"], "254900OPPU84GM83MG36");
        cred.sad().verify().unwrap();

        let parsed = Credential::from_raw(cred.raw().clone()).unwrap();
        assert_eq!(parsed, cred);
    }

    #[test]
    fn test_rejects_keri() {
        assert!(matches!(
            Credential::from_map(acdc_map("KERI10JSON000000_"), None),
            Err(CoreError::UnexpectedProtocol {
                expected: Protocol::Acdc,
                ..
            })
        ));
    }
}

//! Count codes.
//!
//! A count code frames a group of attachments. Its hard part names the
//! group kind and its soft part holds a base64 count: either the number of
//! items that follow, or, for opaque blocks, their length in quadlets
//! (text) or triplets (binary).

use std::fmt;

use crate::b64;
use crate::cold::Domain;
use crate::error::{CodeTable, CoreError};

/// Count codes (keripy v1 `CtrDex`).
pub mod codex {
    pub const CONTROLLER_IDX_SIGS: &str = "-A";
    pub const WITNESS_IDX_SIGS: &str = "-B";
    pub const NON_TRANS_RECEIPT_COUPLES: &str = "-C";
    pub const TRANS_RECEIPT_QUADRUPLES: &str = "-D";
    pub const FIRST_SEEN_REPLAY_COUPLES: &str = "-E";
    pub const TRANS_IDX_SIG_GROUPS: &str = "-F";
    pub const SEAL_SOURCE_COUPLES: &str = "-G";
    pub const TRANS_LAST_IDX_SIG_GROUPS: &str = "-H";
    pub const SEAL_SOURCE_TRIPLES: &str = "-I";
    pub const SAD_PATH_SIG_GROUP: &str = "-J";
    pub const ROOT_SAD_PATH_SIG_GROUPS: &str = "-K";
    pub const PATHED_MATERIAL_QUADLETS: &str = "-L";
    pub const ATTACHED_MATERIAL_QUADLETS: &str = "-V";
    pub const BIG_ATTACHED_MATERIAL_QUADLETS: &str = "-0V";
}

/// What a count measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountUnit {
    /// Number of framed items or tuples.
    Items,
    /// Length of an opaque block in quadlets (text) or triplets (binary).
    Quadlets,
}

/// Registry entry for a count code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterSpec {
    pub code: &'static str,
    pub name: &'static str,
    pub hs: usize,
    pub ss: usize,
    pub fs: usize,
    pub unit: CountUnit,
}

impl CounterSpec {
    const fn small(code: &'static str, name: &'static str, unit: CountUnit) -> Self {
        Self {
            code,
            name,
            hs: 2,
            ss: 2,
            fs: 4,
            unit,
        }
    }

    /// Size of the count token itself in `domain`.
    pub fn token_size(&self, domain: Domain) -> usize {
        domain.byte_len(self.fs)
    }

    /// Largest count the soft field can hold.
    pub fn max_count(&self) -> u64 {
        (1u64 << (6 * self.ss)) - 1
    }
}

/// Every count code this crate understands.
pub const REGISTRY: &[CounterSpec] = &[
    CounterSpec::small(codex::CONTROLLER_IDX_SIGS, "ControllerIdxSigs", CountUnit::Items),
    CounterSpec::small(codex::WITNESS_IDX_SIGS, "WitnessIdxSigs", CountUnit::Items),
    CounterSpec::small(
        codex::NON_TRANS_RECEIPT_COUPLES,
        "NonTransReceiptCouples",
        CountUnit::Items,
    ),
    CounterSpec::small(
        codex::TRANS_RECEIPT_QUADRUPLES,
        "TransReceiptQuadruples",
        CountUnit::Items,
    ),
    CounterSpec::small(
        codex::FIRST_SEEN_REPLAY_COUPLES,
        "FirstSeenReplayCouples",
        CountUnit::Items,
    ),
    CounterSpec::small(codex::TRANS_IDX_SIG_GROUPS, "TransIdxSigGroups", CountUnit::Items),
    CounterSpec::small(codex::SEAL_SOURCE_COUPLES, "SealSourceCouples", CountUnit::Items),
    CounterSpec::small(
        codex::TRANS_LAST_IDX_SIG_GROUPS,
        "TransLastIdxSigGroups",
        CountUnit::Items,
    ),
    CounterSpec::small(codex::SEAL_SOURCE_TRIPLES, "SealSourceTriples", CountUnit::Items),
    CounterSpec::small(codex::SAD_PATH_SIG_GROUP, "SadPathSigGroup", CountUnit::Items),
    CounterSpec::small(
        codex::ROOT_SAD_PATH_SIG_GROUPS,
        "RootSadPathSigGroups",
        CountUnit::Items,
    ),
    CounterSpec::small(
        codex::PATHED_MATERIAL_QUADLETS,
        "PathedMaterialQuadlets",
        CountUnit::Quadlets,
    ),
    CounterSpec::small(
        codex::ATTACHED_MATERIAL_QUADLETS,
        "AttachedMaterialQuadlets",
        CountUnit::Quadlets,
    ),
    CounterSpec {
        code: codex::BIG_ATTACHED_MATERIAL_QUADLETS,
        name: "BigAttachedMaterialQuadlets",
        hs: 3,
        ss: 5,
        fs: 8,
        unit: CountUnit::Quadlets,
    },
];

/// Look up a hard count code.
pub fn spec(code: &str) -> Option<&'static CounterSpec> {
    REGISTRY.iter().find(|s| s.code == code)
}

/// Hard size selected by the second code character.
fn hardage(second: u8) -> Option<usize> {
    match second {
        b'A'..=b'Z' | b'a'..=b'z' => Some(2),
        b'0' => Some(3),
        _ => None,
    }
}

/// A parsed count code.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Counter {
    spec: &'static CounterSpec,
    count: u64,
    qb64: String,
}

impl Counter {
    /// Encode a count under a registered code.
    pub fn new(code: &str, count: u64) -> Result<Self, CoreError> {
        let spec = spec(code).ok_or_else(|| CoreError::unknown(CodeTable::Counter, code))?;
        let soft = b64::int_to_b64(count, spec.ss).ok_or_else(|| CoreError::CountOverflow {
            code: code.to_owned(),
            count,
        })?;
        Ok(Self {
            spec,
            count,
            qb64: format!("{}{soft}", spec.code),
        })
    }

    /// Parse the count code at the start of `bytes`.
    pub fn from_stream(bytes: &[u8], domain: Domain) -> Result<Self, CoreError> {
        let lead = domain.lead(bytes, 2)?;
        let lead_bytes = lead.as_bytes();
        if lead_bytes[0] != b'-' {
            return Err(CoreError::unknown(CodeTable::Counter, lead.clone()));
        }
        let hs = hardage(lead_bytes[1])
            .ok_or_else(|| CoreError::unknown(CodeTable::Counter, lead.clone()))?;
        let hard = domain.lead(bytes, hs)?;
        let spec = spec(&hard).ok_or_else(|| CoreError::unknown(CodeTable::Counter, hard))?;
        let qb64 = domain.lead(bytes, spec.fs)?;
        let count = b64::b64_to_int(&qb64.as_bytes()[spec.hs..])?;
        Ok(Self { spec, count, qb64 })
    }

    pub fn from_qb64(text: &str) -> Result<Self, CoreError> {
        let counter = Self::from_stream(text.as_bytes(), Domain::Text)?;
        if counter.qb64.len() != text.len() {
            return Err(CoreError::InvalidPrimitive(format!(
                "trailing characters after count code {}",
                counter.code()
            )));
        }
        Ok(counter)
    }

    pub fn code(&self) -> &'static str {
        self.spec.code
    }

    pub fn spec(&self) -> &'static CounterSpec {
        self.spec
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Byte size of this token in `domain`.
    pub fn token_size(&self, domain: Domain) -> usize {
        self.spec.token_size(domain)
    }

    /// Byte length of the opaque block a quadlet count frames.
    pub fn block_size(&self, domain: Domain) -> Option<usize> {
        match self.spec.unit {
            CountUnit::Quadlets => Some(self.count as usize * domain.unit()),
            CountUnit::Items => None,
        }
    }

    pub fn qb64(&self) -> &str {
        &self.qb64
    }

    pub fn qb64b(&self) -> &[u8] {
        self.qb64.as_bytes()
    }

    pub fn qb2(&self) -> Vec<u8> {
        b64::decode(self.qb64.as_bytes()).unwrap_or_default()
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Counter({} {}, count={})", self.spec.code, self.spec.name, self.count)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        let c = Counter::from_stream(b"-AABAAApXL", Domain::Text).unwrap();
        assert_eq!(c.code(), codex::CONTROLLER_IDX_SIGS);
        assert_eq!(c.count(), 1);
        assert_eq!(c.qb64(), "-AAB");
        assert_eq!(c.token_size(Domain::Text), 4);
    }

    #[test]
    fn test_parse_binary() {
        let c = Counter::new(codex::TRANS_IDX_SIG_GROUPS, 65).unwrap();
        let qb2 = c.qb2();
        assert_eq!(qb2.len(), 3);
        let parsed = Counter::from_stream(&qb2, Domain::Binary).unwrap();
        assert_eq!(parsed, c);
        assert_eq!(parsed.token_size(Domain::Binary), 3);
    }

    #[test]
    fn test_big_counter() {
        let c = Counter::new(codex::BIG_ATTACHED_MATERIAL_QUADLETS, 5000).unwrap();
        assert_eq!(c.qb64().len(), 8);
        assert!(c.qb64().starts_with("-0V"));
        let parsed = Counter::from_qb64(c.qb64()).unwrap();
        assert_eq!(parsed.count(), 5000);
        assert_eq!(parsed.block_size(Domain::Text), Some(20000));
        assert_eq!(parsed.block_size(Domain::Binary), Some(15000));
    }

    #[test]
    fn test_count_overflow() {
        assert!(matches!(
            Counter::new(codex::CONTROLLER_IDX_SIGS, 4096),
            Err(CoreError::CountOverflow { .. })
        ));
        assert!(Counter::new(codex::CONTROLLER_IDX_SIGS, 4095).is_ok());
    }

    #[test]
    fn test_unknown_codes() {
        for bad in [&b"-ZAB"[..], b"-_AB", b"AAAB", b"--AAABAA"] {
            assert!(
                matches!(
                    Counter::from_stream(bad, Domain::Text),
                    Err(CoreError::UnknownCode { table: CodeTable::Counter, .. })
                ),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_short_buffer() {
        assert!(Counter::from_stream(b"-A", Domain::Text)
            .unwrap_err()
            .is_incomplete());
    }

    #[test]
    fn test_registry_units() {
        assert_eq!(spec("-V").unwrap().unit, CountUnit::Quadlets);
        assert_eq!(spec("-L").unwrap().unit, CountUnit::Quadlets);
        assert_eq!(spec("-A").unwrap().unit, CountUnit::Items);
        assert_eq!(spec("-0V").unwrap().max_count(), (1 << 30) - 1);
    }
}

//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use cesr_core::matter::{self, codex};
use cesr_core::{Kind, Matter, SadMap};

use crate::fixtures::KelBuilder;

/// Fixed-size codes exercised by the generators.
pub const FIXED_CODES: &[&str] = &[
    codex::ED25519_SEED,
    codex::ED25519N,
    codex::ED25519,
    codex::BLAKE3_256,
    codex::SHORT,
    codex::SALT_128,
    codex::ED25519_SIG,
    codex::BLAKE3_512,
    codex::LONG,
    codex::ECDSA_256K1,
    codex::TBD1,
];

/// Raw size taken by a fixed-size code.
pub fn raw_size(code: &str) -> usize {
    let sizage = matter::sizage(code).expect("code is registered");
    let fs = sizage.fs.expect("code is fixed size");
    (fs - sizage.cs()) * 3 / 4 - sizage.ls
}

/// Generate a serialization kind.
pub fn kind() -> impl Strategy<Value = Kind> {
    prop_oneof![Just(Kind::Json), Just(Kind::Cbor), Just(Kind::Mgpk)]
}

/// Generate a fixed-size primitive.
pub fn fixed_matter() -> impl Strategy<Value = Matter> {
    prop::sample::select(FIXED_CODES).prop_flat_map(|code| {
        prop::collection::vec(any::<u8>(), raw_size(code))
            .prop_map(move |raw| Matter::from_raw(code, &raw).expect("raw has the code's size"))
    })
}

/// Generate a variable-size byte primitive of up to `max_len` raw bytes.
pub fn variable_matter(max_len: usize) -> impl Strategy<Value = Matter> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
        .prop_map(|raw| Matter::from_raw(codex::BYTES_L0, &raw).expect("variable size fits"))
}

/// Generate a field value: strings and short string lists.
pub fn field_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,40}".prop_map(Value::String),
        prop::collection::vec("[A-Za-z0-9_-]{0,44}", 0..4)
            .prop_map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
    ]
}

/// Generate an ACDC field map with an empty SAID field.
pub fn sad_map(kind: Kind) -> impl Strategy<Value = SadMap> {
    prop::collection::vec(("[a-z]{2,6}", field_value()), 0..8).prop_map(move |fields| {
        let mut map = SadMap::new();
        map.insert("v".into(), Value::String(format!("ACDC10{kind}000000_")));
        map.insert("d".into(), Value::String(String::new()));
        for (label, value) in fields {
            map.insert(label, value);
        }
        map
    })
}

/// Generate a signed key event log of 1 to `max_events` events.
pub fn kel(max_events: usize) -> impl Strategy<Value = KelBuilder> {
    (
        kind(),
        any::<u8>(),
        prop::collection::vec(any::<bool>(), 0..max_events.max(1)),
    )
        .prop_map(|(kind, seed, ops)| {
            let mut kel = KelBuilder::incept(kind, seed);
            for rotate in ops {
                if rotate {
                    kel.rotate();
                } else {
                    kel.interact(Vec::new());
                }
            }
            kel
        })
}

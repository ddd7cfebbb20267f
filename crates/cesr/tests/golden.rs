//! Golden stream tests for cross-implementation verification.
//!
//! Every implementation must parse the keripy key event log into the same
//! messages, verify its SAIDs and signatures, and pack it back to the same
//! bytes.

use cesr::core::counter::codex;
use cesr::core::{b64, crypto, CoreError};
use cesr::parser::ParseError;
use cesr::{CesrConfig, CesrError, Codec, Message, MessageBuffer, Parser, ParserConfig};
use cesr_testkit::{signing_keys, Signer, KERIPY_EVENTS, KERIPY_KEL, KERIPY_KEL_LEN};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn golden_messages() -> Vec<Message> {
    Codec::default().parse_all(KERIPY_KEL).unwrap()
}

#[test]
fn test_golden_stream_shape() {
    init_tracing();
    let messages = golden_messages();
    assert_eq!(messages.len(), KERIPY_EVENTS.len());

    for (message, expected) in messages.iter().zip(KERIPY_EVENTS) {
        let event = message.body().keri_event().unwrap();
        assert_eq!(message.body().raw().len(), expected.size);
        assert_eq!(event.ilk().unwrap(), expected.ilk);
        assert_eq!(event.sn().unwrap(), expected.sn);
        assert_eq!(event.sad().said().unwrap().qb64(), expected.said);

        assert_eq!(message.attachments().len(), 1);
        let group = &message.attachments()[0];
        assert_eq!(group.code(), codex::CONTROLLER_IDX_SIGS);
        assert_eq!(group.count(), 1);
        assert_eq!(group.token().as_ref(), b"-AAB");
    }
}

#[test]
fn test_golden_stream_repacks_identically() {
    let codec = Codec::default();
    let messages = golden_messages();
    let packed = codec.pack(&messages);
    assert_eq!(packed.len(), KERIPY_KEL_LEN);
    assert_eq!(packed, KERIPY_KEL.as_bytes());
}

#[test]
fn test_golden_saids_verify() {
    let codec = Codec::default();
    for message in golden_messages() {
        let sad = message.body().sad().unwrap();
        codec.verify(&sad).unwrap();
    }
}

#[test]
fn test_golden_signatures_verify() {
    let codec = Codec::default();
    let keys = signing_keys();
    for (message, keys) in golden_messages().iter().zip(&keys) {
        assert_eq!(codec.verify_signatures(message, keys).unwrap(), 1);
    }
}

#[test]
fn test_golden_event_chain() {
    let messages = golden_messages();
    let events: Vec<_> = messages
        .iter()
        .map(|m| m.body().keri_event().unwrap())
        .collect();

    for pair in events.windows(2) {
        let prior = pair[1].prior().unwrap().unwrap();
        assert_eq!(&prior, pair[0].sad().said().unwrap());
    }

    // Each rotation reveals keys committed to by the previous establishment event.
    let mut committed = events[0].next_digests().unwrap();
    for event in events.iter().skip(1).filter(|e| e.is_establishment()) {
        let key = &event.keys().unwrap()[0];
        let digest = crypto::digest(committed[0].code(), key.qb64b()).unwrap();
        assert_eq!(digest, committed[0]);
        committed = event.next_digests().unwrap();
    }
}

#[test]
fn test_golden_stream_in_binary_attachments() {
    let parser = Parser::default();
    let mut binary = Vec::new();
    for message in golden_messages() {
        binary.extend_from_slice(message.body().raw());
        for group in message.attachments() {
            binary.extend_from_slice(&b64::decode(&group.to_bytes()).unwrap());
        }
    }
    assert!(binary.len() < KERIPY_KEL_LEN);

    let messages = parser.parse_all(binary.clone()).unwrap();
    assert_eq!(messages.len(), KERIPY_EVENTS.len());
    assert_eq!(cesr::parser::pack(&messages), binary);

    let codec = Codec::default();
    for (message, keys) in messages.iter().zip(&signing_keys()) {
        assert_eq!(codec.verify_signatures(message, keys).unwrap(), 1);
    }
}

#[test]
fn test_golden_stream_through_buffer() {
    for chunk in [1, 7, 64, 500, KERIPY_KEL_LEN] {
        let mut buffer = MessageBuffer::new(ParserConfig::default());
        let mut messages = Vec::new();
        for piece in KERIPY_KEL.as_bytes().chunks(chunk) {
            messages.extend(buffer.push(piece).unwrap());
        }
        messages.extend(buffer.flush().unwrap());
        assert_eq!(messages, golden_messages(), "chunk size {chunk}");
    }
}

#[test]
fn test_unknown_code_stops_without_advancing() {
    let golden = golden_messages();
    let first = &golden[0];
    let body = first.body().raw();
    let mut stream = first.to_bytes().to_vec();
    stream.extend_from_slice(body);
    stream.extend_from_slice(b"-ZAB");

    let parser = Parser::default();
    let mut messages = parser.messages(stream);
    assert!(messages.next().unwrap().is_ok());
    let before = messages.position();
    let err = messages.next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        ParseError::Core(CoreError::UnknownCode { ref code, .. }) if code == "-Z"
    ));
    assert_eq!(messages.position(), before);
    assert!(messages.next().is_none());
}

#[test]
fn test_version_past_max_offset_rejected() {
    let icp = std::str::from_utf8(golden_messages()[0].body().raw())
        .unwrap()
        .to_owned();
    let shifted = icp.replacen('{', r#"{"xxxxxxxx":"","#, 1);
    let stream = format!("{shifted}-AAB{}", "A".repeat(88));
    assert_eq!(
        Codec::default().parse_all(stream),
        Err(CesrError::Parse(ParseError::Core(CoreError::MissingVersion(12))))
    );
}

#[test]
fn test_tampered_body_fails_said() {
    let tampered = KERIPY_KEL.replacen(r#""bt":"0""#, r#""bt":"1""#, 1);
    let codec = Codec::new(CesrConfig {
        verify_saids: true,
        ..CesrConfig::default()
    })
    .unwrap();
    let results: Vec<_> = codec.parse(tampered.clone()).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(CesrError::Validation(_))));

    let lenient = Codec::default();
    let messages = lenient.parse_all(tampered).unwrap();
    assert_eq!(messages.len(), KERIPY_EVENTS.len());
    assert!(lenient.verify(&messages[0].body().sad().unwrap()).is_err());
    assert!(lenient
        .verify_signatures(&messages[0], &signing_keys()[0])
        .is_err());
}

#[test]
fn test_credential_with_sad_path_signatures() {
    init_tracing();
    let codec = Codec::default();
    let signer = Signer::from_seed([5; 32]);
    let fields = match json!({
        "v": "ACDC10JSON000000_",
        "d": "",
        "i": signer.verfer().qb64(),
        "s": "EFXIx7URwmw7AVQTBcMxPXfOOJ2YYA1SJAam69DXV8D2",
        "a": {"d": "", "name": "alice"}
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let credential = codec.saidify(fields).unwrap();
    let siger = signer.sign_indexed(credential.raw(), 0);

    // Root path "-", one sub-path group "-" holding a controller signature.
    let mut stream = credential.raw().to_vec();
    stream.extend_from_slice(b"-KAB6AABAAA--JAB6AABAAA--AAB");
    stream.extend_from_slice(siger.qb64b());

    let messages = codec.parse_all(stream.clone()).unwrap();
    let message = &messages[0];
    assert_eq!(message.body().credential().unwrap().issuer().unwrap(), signer.verfer());

    let root = &message.attachments()[0];
    assert_eq!(root.code(), codex::ROOT_SAD_PATH_SIG_GROUPS);
    assert_eq!(root.path().unwrap().matter().unwrap().bext().unwrap(), "-");

    let sad_path = root.items()[0].as_group().unwrap();
    let tuple = sad_path.items()[0].as_tuple().unwrap();
    assert_eq!(
        tuple[0].as_primitive().unwrap().matter().unwrap().bext().unwrap(),
        "-"
    );
    let sigs = tuple[1].as_group().unwrap();
    let parsed = sigs.sigers().next().unwrap().indexer().unwrap();
    crypto::verify_siger(&signer.verfer(), message.body().raw(), &parsed).unwrap();

    // Controller signatures nested under a path are not top-level ones.
    assert_eq!(message.controller_sigers().count(), 0);
    assert_eq!(codec.pack(&messages), stream);
}

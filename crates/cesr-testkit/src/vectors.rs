//! Golden test vectors for cross-implementation verification.
//!
//! The stream below is a key event log produced by keripy: one inception,
//! four rotations and three interactions, each signed by its controller
//! with a single indexed signature. Every implementation must parse it
//! into the same messages, verify its SAIDs and signatures, and pack it
//! back to the same bytes.

use cesr_core::{Ilk, Matter};

/// Expected shape of one event of [`KERIPY_KEL`].
#[derive(Debug, Clone)]
pub struct GoldenEvent {
    /// Event type.
    pub ilk: Ilk,
    /// Sequence number.
    pub sn: u128,
    /// Body size announced by the version string.
    pub size: usize,
    /// Embedded SAID.
    pub said: &'static str,
    /// Current signing keys, for establishment events.
    pub keys: &'static [&'static str],
}

/// Total byte length of [`KERIPY_KEL`].
pub const KERIPY_KEL_LEN: usize = 3006;

/// The keripy key event log, text domain.
pub const KERIPY_KEL: &str = concat!(
    r#"{"v":"KERI10JSON00012b_","t":"icp","d":"EIcca2-uqsicYK7-q5gxlZXuzOkqrNSL3JIaLflSOOgF","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"0","kt":"1","k":["DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx"],"nt":"1","n":["EFXIx7URwmw7AVQTBcMxPXfOOJ2YYA1SJAam69DXV8D2"],"bt":"0","b":[],"c":[],"a":[]}"#,
    "-AABAAApXLez5eVIs6YyRXOMDMBy4cTm2GvsilrZlcMmtBbO5twLst_jjFoEyfKTWKntEtv9JPBv1DLkqg-ImDmGPM8E",
    r#"{"v":"KERI10JSON000160_","t":"rot","d":"EJDbQDHpeEoKjZLbs08GKBxIXhe9T-Xi7mbejQmJdnZG","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"1","p":"EIcca2-uqsicYK7-q5gxlZXuzOkqrNSL3JIaLflSOOgF","kt":"1","k":["DOwvH3i0ceL1GBqaLxecDIsk6NFDL-Qv6SFq5Gj6JMAB"],"nt":"1","n":["EFOcjb2T4uNP6C20sStcAzOyXDU27_2vWpTzAFbTarAc"],"bt":"0","br":[],"ba":[],"a":[]}"#,
    "-AABAAD29Xiiek51i8FBEIenIDOOj0j3CuKbIeRK9aNNSyMyyH88ho9qb6ietcQjKy4bcERbCHC5t7fkdt7jMW8YT5IN",
    r#"{"v":"KERI10JSON000160_","t":"rot","d":"EHdVYE9HBxEBFMzEyo8Cbp1BBzsbbUFyZ4qQ3L5kZVnO","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"2","p":"EJDbQDHpeEoKjZLbs08GKBxIXhe9T-Xi7mbejQmJdnZG","kt":"1","k":["DAGO1PiBVK8Jzj0GqN871WJJAL6DXtZ_7BeSb8LakAbS"],"nt":"1","n":["EEPCpzJEEBdbSkTVJB92tn5aLmWyeBMUdz0iDtyNdgdn"],"bt":"0","br":[],"ba":[],"a":[]}"#,
    "-AABAADEpCJe4OAw-L7_NFx7Cm-SEBva6pHTE7PzcemJ8LDv5sBaak0F3v9DkqSKXAjT8xe0dF6CAAiprpnt9-NompUB",
    r#"{"v":"KERI10JSON0000cb_","t":"ixn","d":"EK0IxKaIRCIW197CaM24cjlOP9dLuvcRQ4hsUbI-czFc","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"3","p":"EHdVYE9HBxEBFMzEyo8Cbp1BBzsbbUFyZ4qQ3L5kZVnO","a":[]}"#,
    "-AABAABSGEUpho310XVTOJs355Yz6zruY4T6DwAEOln20nvfu-NtG8KhUimxvcL98V2oibSdtD3KZQc5wDmkkDG6duQN",
    r#"{"v":"KERI10JSON0000cb_","t":"ixn","d":"EDia68NPn8go5ZEG-aFRVQx35bTbd2KdkX8wjaDZnfQT","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"4","p":"EK0IxKaIRCIW197CaM24cjlOP9dLuvcRQ4hsUbI-czFc","a":[]}"#,
    "-AABAACmmvkaQSj6GIsi6GY2gM6dF0j6jJldCDlPSllK9F-rB8oBsf6Zw5RNgtQf1ybkAdO_QF6-zjsH8X4DwN1PLAMH",
    r#"{"v":"KERI10JSON000160_","t":"rot","d":"EM0X0dMakhwj_H-WoaAtESja6d952Fi1JDrUtp1tGQTf","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"5","p":"EDia68NPn8go5ZEG-aFRVQx35bTbd2KdkX8wjaDZnfQT","kt":"1","k":["DMkoIldTmEcAPMTUYvdG40e0MMYXJYVQKVMe8RnZCctX"],"nt":"1","n":["EMYJJC96GwDK0rO6RKgz5R8ehShJbRPk6Y4NYq7URiNp"],"bt":"0","br":[],"ba":[],"a":[]}"#,
    "-AABAACVy62ybeKd4spCvB0w0q3vop9Vgs6loCMyfBYssfUbHM7iR59a9eZBWSdrOGR_684br3j_7QB6FFs0yhgI9-UB",
    r#"{"v":"KERI10JSON0000cb_","t":"ixn","d":"ECMrnSaWbI9lHX5GtuWu4_cNDNW--8jyn2RTUepjGUBn","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"6","p":"EM0X0dMakhwj_H-WoaAtESja6d952Fi1JDrUtp1tGQTf","a":[]}"#,
    "-AABAACfFj5T8P1caAC_wmn8D7MQYzgFai8WP8BN8HI42cpBmE7wU2gJy4HSzt6CKFJgKmrjWx1qYMupiZoGgQg-9nME",
    r#"{"v":"KERI10JSON000132_","t":"rot","d":"EHTwtT_CHN5WjnbNIwmHzOtXIJ7oN0mntOSYZISYob6A","i":"DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx","s":"7","p":"ECMrnSaWbI9lHX5GtuWu4_cNDNW--8jyn2RTUepjGUBn","kt":"1","k":["DHMGP2ArtkaBPTXyY48smcESmoaUFT5hYBrLNi8ul2tZ"],"nt":"0","n":[],"bt":"0","br":[],"ba":[],"a":[]}"#,
    "-AABAABLPx9jZm8wjHMJaUw176A59cRWLitDnjx1F0C1y2E2T8QNnL2F6YsA1DdkueixoaMN0bCVqxAHL80xfrADfycP",
);

/// Per-event expectations for [`KERIPY_KEL`], in stream order.
pub const KERIPY_EVENTS: &[GoldenEvent] = &[
    GoldenEvent {
        ilk: Ilk::Icp,
        sn: 0,
        size: 0x12b,
        said: "EIcca2-uqsicYK7-q5gxlZXuzOkqrNSL3JIaLflSOOgF",
        keys: &["DNG2arBDtHK_JyHRAq-emRdC6UM-yIpCAeJIWDiXp4Hx"],
    },
    GoldenEvent {
        ilk: Ilk::Rot,
        sn: 1,
        size: 0x160,
        said: "EJDbQDHpeEoKjZLbs08GKBxIXhe9T-Xi7mbejQmJdnZG",
        keys: &["DOwvH3i0ceL1GBqaLxecDIsk6NFDL-Qv6SFq5Gj6JMAB"],
    },
    GoldenEvent {
        ilk: Ilk::Rot,
        sn: 2,
        size: 0x160,
        said: "EHdVYE9HBxEBFMzEyo8Cbp1BBzsbbUFyZ4qQ3L5kZVnO",
        keys: &["DAGO1PiBVK8Jzj0GqN871WJJAL6DXtZ_7BeSb8LakAbS"],
    },
    GoldenEvent {
        ilk: Ilk::Ixn,
        sn: 3,
        size: 0xcb,
        said: "EK0IxKaIRCIW197CaM24cjlOP9dLuvcRQ4hsUbI-czFc",
        keys: &[],
    },
    GoldenEvent {
        ilk: Ilk::Ixn,
        sn: 4,
        size: 0xcb,
        said: "EDia68NPn8go5ZEG-aFRVQx35bTbd2KdkX8wjaDZnfQT",
        keys: &[],
    },
    GoldenEvent {
        ilk: Ilk::Rot,
        sn: 5,
        size: 0x160,
        said: "EM0X0dMakhwj_H-WoaAtESja6d952Fi1JDrUtp1tGQTf",
        keys: &["DMkoIldTmEcAPMTUYvdG40e0MMYXJYVQKVMe8RnZCctX"],
    },
    GoldenEvent {
        ilk: Ilk::Ixn,
        sn: 6,
        size: 0xcb,
        said: "ECMrnSaWbI9lHX5GtuWu4_cNDNW--8jyn2RTUepjGUBn",
        keys: &[],
    },
    GoldenEvent {
        ilk: Ilk::Rot,
        sn: 7,
        size: 0x132,
        said: "EHTwtT_CHN5WjnbNIwmHzOtXIJ7oN0mntOSYZISYob6A",
        keys: &["DHMGP2ArtkaBPTXyY48smcESmoaUFT5hYBrLNi8ul2tZ"],
    },
];

/// Signing keys in force for each event of [`KERIPY_KEL`].
///
/// Interaction events are signed with the keys of the latest establishment
/// event.
pub fn signing_keys() -> Vec<Vec<Matter>> {
    let mut current: &[&str] = &[];
    KERIPY_EVENTS
        .iter()
        .map(|event| {
            if event.ilk.is_establishment() {
                current = event.keys;
            }
            current
                .iter()
                .map(|key| Matter::from_qb64(key).expect("golden key is well formed"))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_length() {
        assert_eq!(KERIPY_KEL.len(), KERIPY_KEL_LEN);
        let bodies: usize = KERIPY_EVENTS.iter().map(|e| e.size).sum();
        assert_eq!(bodies + KERIPY_EVENTS.len() * 92, KERIPY_KEL_LEN);
    }

    #[test]
    fn test_keys_carry_forward() {
        let keys = signing_keys();
        assert_eq!(keys.len(), 8);
        assert_eq!(keys[3], keys[2]);
        assert_eq!(keys[4], keys[2]);
        assert_eq!(keys[6], keys[5]);
        assert_ne!(keys[7], keys[6]);
    }
}

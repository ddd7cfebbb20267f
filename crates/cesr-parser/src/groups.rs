//! Attachment group decoders.
//!
//! Each decoder reads the items its count code frames from a cursor that
//! sits just past the count token. Nested groups recurse through
//! [`decode_group`] with the depth bumped by one.

use bytes::Bytes;
use cesr_core::counter::codex;
use cesr_core::{indexer, matter, CoreError, Counter, Domain};

use crate::cursor::Cursor;
use crate::error::{ParseError, Result};
use crate::message::{Group, IndexedPrimitive, Item, Primitive, PrimitiveKind};
use crate::parser::ParserConfig;

use PrimitiveKind::*;

/// Decode one count token and the group it frames.
pub(crate) fn decode_group(
    cur: &mut Cursor,
    domain: Domain,
    config: &ParserConfig,
    depth: usize,
) -> Result<Group> {
    let counter = Counter::from_stream(cur.remaining(), domain)?;
    let token = cur.take(counter.token_size(domain))?;
    decode_counted(cur, counter, token, domain, config, depth)
}

fn decode_counted(
    cur: &mut Cursor,
    counter: Counter,
    token: Bytes,
    domain: Domain,
    config: &ParserConfig,
    depth: usize,
) -> Result<Group> {
    if depth > config.max_depth {
        return Err(ParseError::TooDeep(config.max_depth));
    }

    let code = counter.code();
    let count = counter.count();
    tracing::trace!(code, count, depth, offset = cur.position(), "decoding group");

    let mut path = None;
    let items = match code {
        codex::CONTROLLER_IDX_SIGS | codex::WITNESS_IDX_SIGS => {
            repeat(count, || indexed(cur, domain))?
        }
        codex::NON_TRANS_RECEIPT_COUPLES => {
            repeat(count, || tuple(cur, domain, &[Verfer, Cigar]))?
        }
        codex::TRANS_RECEIPT_QUADRUPLES => repeat(count, || {
            let mut items = primitives(cur, domain, &[Prefixer, Seqner, Saider])?;
            items.push(indexed(cur, domain)?);
            Ok(Item::Tuple(items))
        })?,
        codex::FIRST_SEEN_REPLAY_COUPLES => {
            repeat(count, || tuple(cur, domain, &[Seqner, Dater]))?
        }
        codex::TRANS_IDX_SIG_GROUPS => repeat(count, || {
            let mut items = primitives(cur, domain, &[Prefixer, Seqner, Saider])?;
            let sigs = nested(cur, domain, config, depth, code, &[codex::CONTROLLER_IDX_SIGS])?;
            items.push(Item::Group(sigs));
            Ok(Item::Tuple(items))
        })?,
        codex::SEAL_SOURCE_COUPLES => repeat(count, || tuple(cur, domain, &[Seqner, Saider]))?,
        codex::TRANS_LAST_IDX_SIG_GROUPS => repeat(count, || {
            let mut items = primitives(cur, domain, &[Prefixer])?;
            let sigs = nested(cur, domain, config, depth, code, &[codex::CONTROLLER_IDX_SIGS])?;
            items.push(Item::Group(sigs));
            Ok(Item::Tuple(items))
        })?,
        codex::SEAL_SOURCE_TRIPLES => {
            repeat(count, || tuple(cur, domain, &[Prefixer, Seqner, Saider]))?
        }
        codex::SAD_PATH_SIG_GROUP => vec![sad_path_sig(cur, domain, config, depth)?],
        codex::ROOT_SAD_PATH_SIG_GROUPS => {
            path = Some(primitive(cur, Pather, domain)?);
            repeat(count, || {
                nested(cur, domain, config, depth, code, &[codex::SAD_PATH_SIG_GROUP])
                    .map(Item::Group)
            })?
        }
        codex::PATHED_MATERIAL_QUADLETS => vec![opaque(cur, &counter, domain)?],
        codex::ATTACHED_MATERIAL_QUADLETS | codex::BIG_ATTACHED_MATERIAL_QUADLETS => {
            if config.decode_pipelined {
                pipelined(cur, &counter, domain, config, depth)?
            } else {
                vec![opaque(cur, &counter, domain)?]
            }
        }
        other => return Err(CoreError::UnknownCode {
            table: cesr_core::CodeTable::Counter,
            code: other.to_owned(),
        }
        .into()),
    };

    Ok(Group::new(code, count, domain, token, path, items))
}

fn repeat(count: u64, mut next: impl FnMut() -> Result<Item>) -> Result<Vec<Item>> {
    (0..count).map(|_| next()).collect()
}

fn primitive(cur: &mut Cursor, kind: PrimitiveKind, domain: Domain) -> Result<Primitive> {
    let size = matter::sniff_size(cur.remaining(), domain)?;
    Ok(Primitive::new(kind, domain, cur.take(size)?))
}

fn primitives(cur: &mut Cursor, domain: Domain, kinds: &[PrimitiveKind]) -> Result<Vec<Item>> {
    kinds
        .iter()
        .map(|&kind| primitive(cur, kind, domain).map(Item::Primitive))
        .collect()
}

fn tuple(cur: &mut Cursor, domain: Domain, kinds: &[PrimitiveKind]) -> Result<Item> {
    primitives(cur, domain, kinds).map(Item::Tuple)
}

fn indexed(cur: &mut Cursor, domain: Domain) -> Result<Item> {
    let (size, index, ondex) = indexer::sniff(cur.remaining(), domain)?;
    let bytes = cur.take(size)?;
    Ok(Item::Indexed(IndexedPrimitive::new(domain, bytes, index, ondex)))
}

/// A nested group whose code must be one of `allowed`.
fn nested(
    cur: &mut Cursor,
    domain: Domain,
    config: &ParserConfig,
    depth: usize,
    parent: &'static str,
    allowed: &[&'static str],
) -> Result<Group> {
    let counter = Counter::from_stream(cur.remaining(), domain)?;
    if !allowed.contains(&counter.code()) {
        return Err(ParseError::NestingMismatch {
            parent,
            expected: allowed.first().copied().unwrap_or_default(),
            got: counter.code(),
        });
    }
    let token = cur.take(counter.token_size(domain))?;
    decode_counted(cur, counter, token, domain, config, depth + 1)
}

/// `(subpath, signatures)` where the signatures are a `-F`, `-A` or `-C` group.
fn sad_path_sig(
    cur: &mut Cursor,
    domain: Domain,
    config: &ParserConfig,
    depth: usize,
) -> Result<Item> {
    let subpath = primitive(cur, Pather, domain)?;
    let sigs = nested(
        cur,
        domain,
        config,
        depth,
        codex::SAD_PATH_SIG_GROUP,
        &[
            codex::TRANS_IDX_SIG_GROUPS,
            codex::CONTROLLER_IDX_SIGS,
            codex::NON_TRANS_RECEIPT_COUPLES,
        ],
    )?;
    Ok(Item::Tuple(vec![Item::Primitive(subpath), Item::Group(sigs)]))
}

fn opaque(cur: &mut Cursor, counter: &Counter, domain: Domain) -> Result<Item> {
    let size = block_size(counter, domain)?;
    Ok(Item::Primitive(Primitive::new(Material, domain, cur.take(size)?)))
}

/// Decode every group inside a pipelined block.
fn pipelined(
    cur: &mut Cursor,
    counter: &Counter,
    domain: Domain,
    config: &ParserConfig,
    depth: usize,
) -> Result<Vec<Item>> {
    let size = block_size(counter, domain)?;
    let mut block = cur.split(size)?;
    let mut items = Vec::new();
    while !block.is_empty() {
        let group = decode_group(&mut block, domain, config, depth + 1).map_err(|e| {
            // The block is complete, so running short inside it is malformed input.
            if e.is_incomplete() {
                CoreError::InvalidPrimitive(format!(
                    "group overruns its {size} byte {} block",
                    counter.code()
                ))
                .into()
            } else {
                e
            }
        })?;
        items.push(Item::Group(group));
    }
    Ok(items)
}

fn block_size(counter: &Counter, domain: Domain) -> Result<usize> {
    counter.block_size(domain).ok_or_else(|| {
        CoreError::InvalidPrimitive(format!("{} does not count quadlets", counter.code())).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesr_core::Indexer;

    const SIGER: &str = "AAApXLez5eVIs6YyRXOMDMBy4cTm2GvsilrZlcMmtBbO5twLst_jjFoEyfKTWKntEtv9JPBv1DLkqg-ImDmGPM8E";
    const VERFER: &str = "DKxy2sgzfplyr-tgwIxS19f2OchFHtLwPWD3v4oYimBx";

    fn cigar() -> String {
        format!("0B{}", "A".repeat(86))
    }

    fn quadlets(text: &str) -> String {
        cesr_core::b64::int_to_b64((text.len() / 4) as u64, 2).unwrap()
    }

    fn decode(text: &str) -> Result<(Group, usize)> {
        let mut cur = Cursor::new(Bytes::copy_from_slice(text.as_bytes()));
        let group = decode_group(&mut cur, Domain::Text, &ParserConfig::default(), 0)?;
        Ok((group, cur.position()))
    }

    #[test]
    fn test_controller_sigs() {
        let text = format!("-AAB{SIGER}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        assert_eq!(group.code(), codex::CONTROLLER_IDX_SIGS);
        assert_eq!(group.count(), 1);
        let siger = group.sigers().next().unwrap();
        assert_eq!(siger.index(), 0);
        assert_eq!(siger.indexer().unwrap(), Indexer::from_qb64(SIGER).unwrap());
    }

    #[test]
    fn test_receipt_couples() {
        let text = format!("-CAB{VERFER}{}", cigar());
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, 4 + 44 + 88);
        let couple = group.items()[0].as_tuple().unwrap();
        assert_eq!(couple[0].as_primitive().unwrap().kind(), Verfer);
        assert_eq!(couple[1].as_primitive().unwrap().kind(), Cigar);
    }

    #[test]
    fn test_trans_sig_group_nests_controller_sigs() {
        let digest = format!("E{}", "A".repeat(43));
        let text = format!("-FAB{VERFER}0A{}{digest}-AAB{SIGER}", "A".repeat(22));
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        let tuple = group.items()[0].as_tuple().unwrap();
        assert_eq!(tuple.len(), 4);
        let inner = tuple[3].as_group().unwrap();
        assert_eq!(inner.code(), codex::CONTROLLER_IDX_SIGS);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_nesting_mismatch() {
        let text = format!("-HAB{VERFER}-BAB{SIGER}");
        assert_eq!(
            decode(&text).unwrap_err(),
            ParseError::NestingMismatch {
                parent: codex::TRANS_LAST_IDX_SIG_GROUPS,
                expected: codex::CONTROLLER_IDX_SIGS,
                got: codex::WITNESS_IDX_SIGS,
            }
        );
    }

    #[test]
    fn test_root_sad_path_group() {
        let text = format!("-KAB6AABAAA--JAB6AABAAA--AAB{SIGER}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        let path = group.path().unwrap();
        assert_eq!(path.matter().unwrap().bext().unwrap(), "-");
        let sad_path = group.items()[0].as_group().unwrap();
        assert_eq!(sad_path.code(), codex::SAD_PATH_SIG_GROUP);
        let tuple = sad_path.items()[0].as_tuple().unwrap();
        assert_eq!(tuple[0].as_primitive().unwrap().kind(), Pather);
        assert_eq!(tuple[1].as_group().unwrap().sigers().count(), 1);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_root_sad_path_requires_sad_path_groups() {
        let text = format!("-KAB6AABAAA--AAB{SIGER}");
        assert!(matches!(
            decode(&text),
            Err(ParseError::NestingMismatch { parent: "-K", .. })
        ));
    }

    #[test]
    fn test_pathed_material_is_opaque() {
        let text = "-LAC6AABAAA-";
        let (group, used) = decode(text).unwrap();
        assert_eq!(used, 12);
        let block = group.items()[0].as_primitive().unwrap();
        assert_eq!(block.kind(), Material);
        assert_eq!(&block.bytes()[..], b"6AABAAA-");
    }

    #[test]
    fn test_witness_sigs() {
        let text = format!("-BAB{SIGER}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        assert_eq!(group.code(), codex::WITNESS_IDX_SIGS);
        assert_eq!(group.sigers().next().unwrap().indexer().unwrap().qb64(), SIGER);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_trans_receipt_quadruples() {
        let digest = format!("E{}", "A".repeat(43));
        let seqner = format!("0A{}", "A".repeat(22));
        let text = format!("-DAB{VERFER}{seqner}{digest}{SIGER}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        let quad = group.items()[0].as_tuple().unwrap();
        let kinds: Vec<_> = quad[..3]
            .iter()
            .map(|item| item.as_primitive().unwrap().kind())
            .collect();
        assert_eq!(kinds, vec![Prefixer, Seqner, Saider]);
        assert_eq!(quad[3].as_indexed().unwrap().index(), 0);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_first_seen_replay_couples() {
        let seqner = format!("0A{}", "A".repeat(22));
        let dater = "1AAG2020-08-22T17c50c09d988921p00c00";
        let text = format!("-EAB{seqner}{dater}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, 4 + 24 + 36);
        let couple = group.items()[0].as_tuple().unwrap();
        assert_eq!(couple[0].as_primitive().unwrap().kind(), Seqner);
        assert_eq!(couple[1].as_primitive().unwrap().kind(), Dater);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_seal_source_couples_and_triples() {
        let digest = format!("E{}", "A".repeat(43));
        let seqner = format!("0A{}", "A".repeat(22));

        let text = format!("-GAC{seqner}{digest}{seqner}{digest}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        assert_eq!(group.code(), codex::SEAL_SOURCE_COUPLES);
        assert_eq!(group.items().len(), 2);
        assert_eq!(group.to_bytes(), text.as_bytes());

        let text = format!("-IAB{VERFER}{seqner}{digest}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        assert_eq!(group.code(), codex::SEAL_SOURCE_TRIPLES);
        let triple = group.items()[0].as_tuple().unwrap();
        assert_eq!(triple[0].as_primitive().unwrap().kind(), Prefixer);
        assert_eq!(triple[2].as_primitive().unwrap().kind(), Saider);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_standalone_sad_path_group() {
        let text = format!("-JAB6AABAAA--AAB{SIGER}");
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        assert_eq!(group.code(), codex::SAD_PATH_SIG_GROUP);
        assert!(group.path().is_none());
        assert_eq!(group.items().len(), 1);
        let tuple = group.items()[0].as_tuple().unwrap();
        assert_eq!(tuple.len(), 2);
        let subpath = tuple[0].as_primitive().unwrap();
        assert_eq!(subpath.kind(), Pather);
        assert_eq!(subpath.matter().unwrap().bext().unwrap(), "-");
        let sigs = tuple[1].as_group().unwrap();
        assert_eq!(sigs.code(), codex::CONTROLLER_IDX_SIGS);
        assert_eq!(sigs.sigers().count(), 1);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_pipelined_groups_decode_recursively() {
        let inner = format!("-AAB{SIGER}-CAB{VERFER}{}", cigar());
        let text = format!("-V{}{inner}", quadlets(&inner));
        let (group, used) = decode(&text).unwrap();
        assert_eq!(used, text.len());
        let codes: Vec<_> = group
            .items()
            .iter()
            .map(|item| item.as_group().unwrap().code())
            .collect();
        assert_eq!(codes, vec![codex::CONTROLLER_IDX_SIGS, codex::NON_TRANS_RECEIPT_COUPLES]);
        assert_eq!(group.to_bytes(), text.as_bytes());
    }

    #[test]
    fn test_pipelined_kept_opaque_when_disabled() {
        let inner = format!("-AAB{SIGER}");
        let text = format!("-V{}{inner}", quadlets(&inner));
        let config = ParserConfig {
            decode_pipelined: false,
            ..ParserConfig::default()
        };
        let mut cur = Cursor::new(Bytes::from(text.clone()));
        let group = decode_group(&mut cur, Domain::Text, &config, 0).unwrap();
        assert_eq!(group.items().len(), 1);
        assert_eq!(group.items()[0].as_primitive().unwrap().kind(), Material);
        assert!(cur.is_empty());
    }

    #[test]
    fn test_pipelined_overrun_is_malformed() {
        // Block claims one quadlet but holds a whole -A group token.
        let text = format!("-VAB-AAB{SIGER}");
        let err = decode(&text).unwrap_err();
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_depth_limit() {
        let config = ParserConfig {
            max_depth: 0,
            ..ParserConfig::default()
        };
        let digest = format!("E{}", "A".repeat(43));
        let text = format!("-FAB{VERFER}0A{}{digest}-AAB{SIGER}", "A".repeat(22));
        let mut cur = Cursor::new(Bytes::from(text));
        assert_eq!(
            decode_group(&mut cur, Domain::Text, &config, 0),
            Err(ParseError::TooDeep(0))
        );
    }

    #[test]
    fn test_short_group_is_incomplete() {
        let text = format!("-AAC{SIGER}");
        assert!(decode(&text).unwrap_err().is_incomplete());
    }

    #[test]
    fn test_binary_group() {
        let text = format!("-AAB{SIGER}");
        let qb2 = cesr_core::b64::decode(text.as_bytes()).unwrap();
        let mut cur = Cursor::new(qb2.clone());
        let group = decode_group(&mut cur, Domain::Binary, &ParserConfig::default(), 0).unwrap();
        assert_eq!(cur.position(), 3 + 66);
        assert_eq!(group.domain(), Domain::Binary);
        assert_eq!(group.sigers().next().unwrap().indexer().unwrap().qb64(), SIGER);
        assert_eq!(&group.to_bytes()[..], &qb2[..]);
    }
}

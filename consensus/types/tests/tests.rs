//! Encodings and roots of v0.9.0 records, checked against an independent SSZ implementation.

use sloggers::{null::NullLoggerBuilder, Build};
use ssz::Bitfield;
use strum::IntoEnumIterator;
use types::*;

fn codec(schema: &'static Schema) -> RecordCodec<'static> {
    let log = NullLoggerBuilder.build().expect("should build null logger");
    RecordCodec::new(schema, log)
}

fn h(hex_str: &str) -> Hash256 {
    Hash256::from_slice(&hex::decode(hex_str).expect("valid hex"))
}

fn field(name: &str) -> PathSegment {
    PathSegment::Field(name.to_string())
}

fn checkpoint(epoch: u64, root: u8) -> Value {
    Value::Container(vec![Value::Uint(epoch), Value::bytes(vec![root; 32])])
}

mod default_records {
    use super::*;

    fn check(schema: &'static Schema, kind: RecordKind, len: usize, root: &str) {
        let codec = codec(schema);
        let value = codec.default_record(kind);

        let bytes = codec.encode(kind, &value).unwrap();
        assert_eq!(bytes.len(), len, "{} length", kind);
        assert_eq!(codec.hash_tree_root(kind, &value), Ok(h(root)), "{} root", kind);
        assert_eq!(codec.decode(kind, &bytes), Ok(value));
    }

    #[test]
    fn checkpoint() {
        check(
            Schema::mainnet(),
            RecordKind::Checkpoint,
            40,
            "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b",
        );
    }

    #[test]
    fn beacon_block_header() {
        check(
            Schema::mainnet(),
            RecordKind::BeaconBlockHeader,
            200,
            "b29551e561c317cc76c910a173e0378539e2cf04cd6fb481d751761822865210",
        );
    }

    #[test]
    fn beacon_block() {
        for schema in [Schema::mainnet(), Schema::minimal()] {
            check(
                schema,
                RecordKind::BeaconBlock,
                392,
                "839e4f7d90c6c584fb529c5125a1e9375b087f1a97db77476e9458a9fa99946f",
            );
        }
    }

    #[test]
    fn mainnet_beacon_state() {
        check(
            Schema::mainnet(),
            RecordKind::BeaconState,
            2_163_153,
            "e4358291b02587f480e094e029fe729b4468a57412996e7185baf91dcca95743",
        );
    }

    #[test]
    fn minimal_beacon_state() {
        check(
            Schema::minimal(),
            RecordKind::BeaconState,
            3_025,
            "552ab2c1ce5ab8c947a899f69901d7c9b78921d0e650a9af2a343b212aa626ad",
        );
    }

    #[test]
    fn every_record_round_trips() {
        for schema in [Schema::mainnet(), Schema::minimal()] {
            let codec = codec(schema);
            for kind in RecordKind::iter() {
                let value = codec.default_record(kind);
                let bytes = codec.encode(kind, &value).unwrap();
                assert_eq!(codec.encoded_len(kind, &value), Ok(bytes.len()));
                assert_eq!(codec.decode(kind, &bytes), Ok(value), "{}", kind);
            }
        }
    }
}

#[test]
fn validator_vector() {
    let codec = codec(Schema::mainnet());
    let validator = Value::Container(vec![
        Value::bytes(vec![0x01; 48]),
        Value::bytes(vec![0x02; 32]),
        Value::Uint(32_000_000_000),
        Value::Bool(false),
        Value::Uint(0),
        Value::Uint(1),
        Value::Uint(u64::max_value()),
        Value::Uint(u64::max_value()),
    ]);

    let bytes = codec.encode(RecordKind::Validator, &validator).unwrap();
    assert_eq!(bytes.len(), 121);
    assert_eq!(
        codec.hash_tree_root(RecordKind::Validator, &validator),
        Ok(h("1f807e19f804bfadce16620b1452caf03f8a6f52a43358c38da086678d1ed9ec"))
    );
}

fn attestation() -> Value {
    Value::Container(vec![
        Value::Bits(Bitfield::from_bits(vec![true, false, true])),
        Value::Container(vec![
            Value::Uint(9),
            Value::Uint(2),
            Value::bytes(vec![0x03; 32]),
            checkpoint(1, 0x04),
            checkpoint(2, 0x05),
        ]),
        Value::Bits(Bitfield::from_bits(vec![false, false, false])),
        Value::bytes(vec![0x06; 96]),
    ])
}

#[test]
fn attestation_vector() {
    let codec = codec(Schema::mainnet());
    let attestation = attestation();

    let bytes = codec.encode(RecordKind::Attestation, &attestation).unwrap();
    let expected = format!(
        "{}{}{}{}{}{}{}{}{}",
        // Offset of `aggregation_bits`, then `data`.
        "e8000000",
        "0900000000000000",
        "0200000000000000",
        "03".repeat(32),
        "0100000000000000",
        "04".repeat(32),
        "0200000000000000",
        "05".repeat(32),
        // Offset of `custody_bits`, the signature, then both bitlists with their delimiters.
        format!("e9000000{}0d08", "06".repeat(96)),
    );
    assert_eq!(hex::encode(&bytes), expected);
    assert_eq!(bytes.len(), 234);

    assert_eq!(
        codec.hash_tree_root(RecordKind::Attestation, &attestation),
        Ok(h("dffbcd906ff76ec4ede4732df811c4d2c538bd4afd42262ee0484c202a358dd4"))
    );
    assert_eq!(codec.decode(RecordKind::Attestation, &bytes), Ok(attestation));
}

#[test]
fn oversized_attestations_are_rejected() {
    let codec = codec(Schema::minimal());
    let mut block = codec.default_record(RecordKind::BeaconBlock);
    let body = &mut block.as_mut_slice().unwrap()[3];
    let attestations = &mut body.as_mut_slice().unwrap()[5];
    for _ in 0..129 {
        attestations.push(attestation());
    }

    let err = codec.encode(RecordKind::BeaconBlock, &block).unwrap_err();
    assert_eq!(err.path(), Some("body.attestations".to_string()));
    assert!(codec.hash_tree_root(RecordKind::BeaconBlock, &block).is_err());
}

#[test]
fn malformed_block_is_rejected() {
    let codec = codec(Schema::minimal());
    let block = codec.default_record(RecordKind::BeaconBlock);
    let mut bytes = codec.encode(RecordKind::BeaconBlock, &block).unwrap();

    // Point the body offset beyond the end of the input.
    bytes[72..76].copy_from_slice(&1000u32.to_le_bytes());
    assert!(matches!(
        codec.decode(RecordKind::BeaconBlock, &bytes),
        Err(Error::Decode(ssz::DecodeError::InField { .. }))
            | Err(Error::Decode(ssz::DecodeError::MalformedOffset { .. }))
    ));

    assert!(codec.decode(RecordKind::BeaconBlock, &[]).is_err());
}

#[test]
fn validator_proof() {
    let codec = codec(Schema::minimal());
    let mut state = codec.default_record(RecordKind::BeaconState);

    let validators = state
        .field_mut(
            Schema::minimal()
                .descriptor(RecordKind::BeaconState)
                .as_container()
                .unwrap(),
            "validators",
        )
        .unwrap();
    for i in 0..5 {
        let mut validator = Value::default_for(
            Schema::minimal().descriptor(RecordKind::Validator),
        );
        validator.as_mut_slice().unwrap()[2] = Value::Uint(i * 1_000);
        validators.push(validator);
    }

    let root = codec.hash_tree_root(RecordKind::BeaconState, &state).unwrap();
    let path = [
        field("validators"),
        PathSegment::Index(3),
        field("effective_balance"),
    ];
    let proof = codec.proof(RecordKind::BeaconState, &state, &path).unwrap();

    let mut leaf = [0; 32];
    leaf[0..8].copy_from_slice(&3_000u64.to_le_bytes());
    assert_eq!(proof.leaf, Hash256::from(leaf));
    // Validator (3) + registry of 2^40 (40 + 1 for the length) + state of 20 fields (5).
    assert_eq!(proof.depth, 3 + 41 + 5);
    assert!(proof.verify(root));

    let mut tampered = proof.clone();
    tampered.leaf = Hash256::zero();
    assert!(!tampered.verify(root));
}

#[test]
fn balance_proof() {
    let codec = codec(Schema::minimal());
    let mut state = codec.default_record(RecordKind::BeaconState);
    let balances = &mut state.as_mut_slice().unwrap()[11];
    for i in 0..10 {
        balances.push(Value::Uint(i));
    }

    let root = codec.hash_tree_root(RecordKind::BeaconState, &state).unwrap();
    let proof = codec
        .proof(
            RecordKind::BeaconState,
            &state,
            &[field("balances"), PathSegment::Index(9)],
        )
        .unwrap();

    // Balances 8 and 9 share the third chunk.
    let mut leaf = [0; 32];
    leaf[0..8].copy_from_slice(&8u64.to_le_bytes());
    leaf[8..16].copy_from_slice(&9u64.to_le_bytes());
    assert_eq!(proof.leaf, Hash256::from(leaf));
    assert!(proof.verify(root));

    assert_eq!(
        codec.proof(
            RecordKind::BeaconState,
            &state,
            &[field("balances"), PathSegment::Index(10)],
        ),
        Err(Error::IndexOutOfBounds { index: 10, len: 10 })
    );
}

#[test]
fn cached_state_root() {
    let codec = codec(Schema::minimal());
    let mut state = codec.default_record(RecordKind::BeaconState);
    let mut cache = codec.cached_root(RecordKind::BeaconState);

    for slot in 0..4 {
        state.as_mut_slice().unwrap()[1] = Value::Uint(slot);
        state.as_mut_slice().unwrap()[11].push(Value::Uint(slot * 32));
        assert_eq!(
            cache.recalculate(&state).ok(),
            codec.hash_tree_root(RecordKind::BeaconState, &state).ok()
        );
    }
}

#[test]
fn custom_preset() {
    let preset = Preset {
        validator_registry_limit: 1024,
        ..Preset::minimal()
    };
    let schema = Schema::new(&preset).unwrap();
    let log = NullLoggerBuilder.build().unwrap();
    let codec = RecordCodec::new(&schema, log);

    let state = codec.default_record(RecordKind::BeaconState);
    let minimal_root = minimal_state_root(&state);
    assert_ne!(
        codec.hash_tree_root(RecordKind::BeaconState, &state).unwrap(),
        minimal_root
    );
}

fn minimal_state_root(state: &Value) -> Hash256 {
    codec(Schema::minimal())
        .hash_tree_root(RecordKind::BeaconState, state)
        .unwrap()
}

use quickcheck_macros::quickcheck;
use ssz::*;

fn u8_list(limit: usize) -> SszType {
    SszType::list(SszType::U8, limit).unwrap()
}

fn u8_values(bytes: &[u8]) -> Vec<Value> {
    bytes.iter().map(|b| Value::Uint(*b as u64)).collect()
}

fn round_trip(value: &Value, ty: &SszType) -> Value {
    let bytes = encode(value, ty).expect("should encode");
    assert_eq!(encoded_len(value, ty), Ok(bytes.len()));
    decode(&bytes, ty).expect("should decode")
}

mod container {
    use super::*;

    fn foo() -> SszType {
        SszType::container("Foo", vec![("a", SszType::U64), ("b", u8_list(4))]).unwrap()
    }

    #[test]
    fn variable_field_vector() {
        let value = Value::Container(vec![Value::Uint(5), Value::List(u8_values(&[1, 2]))]);

        let bytes = encode(&value, &foo()).unwrap();
        assert_eq!(hex::encode(&bytes), "05000000000000000c0000000102");
        assert_eq!(decode(&bytes, &foo()), Ok(value));
    }

    #[test]
    fn checkpoint_vector() {
        let ty = SszType::container(
            "Checkpoint",
            vec![("epoch", SszType::U64), ("root", SszType::ByteVector(32))],
        )
        .unwrap();
        let value = Value::Container(vec![Value::Uint(3), Value::bytes(vec![0x11; 32])]);

        let bytes = encode(&value, &ty).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            format!("0300000000000000{}", "11".repeat(32))
        );
        assert_eq!(decode(&bytes, &ty), Ok(value));
    }

    #[test]
    fn multiple_variable_fields() {
        let ty = SszType::container(
            "Bar",
            vec![
                ("a", u8_list(8)),
                ("b", SszType::U16),
                ("c", SszType::Bitlist(32)),
                ("d", u8_list(8)),
            ],
        )
        .unwrap();
        let value = Value::Container(vec![
            Value::List(u8_values(&[1, 2, 3])),
            Value::Uint(0xbeef),
            Value::Bits(Bitfield::from_bits(vec![true; 10])),
            Value::List(vec![]),
        ]);

        let bytes = encode(&value, &ty).unwrap();
        assert_eq!(
            bytes,
            vec![
                14, 0, 0, 0, // a
                0xef, 0xbe, // b
                17, 0, 0, 0, // c
                19, 0, 0, 0, // d
                1, 2, 3, // a
                0xff, 0b0000_0111, // c
            ]
        );
        assert_eq!(decode(&bytes, &ty), Ok(value));
    }

    #[test]
    fn trailing_bytes_on_fixed_container() {
        let ty = SszType::container("Pair", vec![("a", SszType::U8), ("b", SszType::U8)]).unwrap();
        assert_eq!(
            decode(&[1, 2, 3], &ty),
            Err(DecodeError::TrailingBytes {
                len: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn type_mismatch_path() {
        let value = Value::Container(vec![Value::Uint(5), Value::Bool(true)]);
        let err = encode(&value, &foo()).unwrap_err();
        assert_eq!(err.path(), "b");
        assert_eq!(
            err.root_cause(),
            &EncodeError::TypeMismatch {
                expected: "list",
                found: "bool"
            }
        );
    }
}

mod limits {
    use super::*;

    #[test]
    fn list_at_limit() {
        let ty = u8_list(4);
        let value = Value::List(u8_values(&[1, 2, 3, 4]));
        assert_eq!(round_trip(&value, &ty), value);

        let value = Value::List(u8_values(&[1, 2, 3, 4, 5]));
        assert_eq!(
            encode(&value, &ty),
            Err(EncodeError::LimitExceeded { len: 5, limit: 4 })
        );
        assert_eq!(
            decode(&[1, 2, 3, 4, 5], &ty),
            Err(DecodeError::LimitExceeded { len: 5, limit: 4 })
        );
    }

    #[test]
    fn huge_declared_count_is_rejected_cheaply() {
        let ty = SszType::list(u8_list(4), 16).unwrap();
        // The first offset claims 2^26 elements.
        let mut bytes = vec![0, 0, 0, 0b0001_0000];
        bytes.extend_from_slice(&[0; 64]);
        assert_eq!(
            decode(&bytes, &ty),
            Err(DecodeError::MalformedOffset {
                offset: 1 << 28,
                reason: OffsetError::OutOfBounds
            })
        );
    }

    #[test]
    fn bitlist_limit() {
        let ty = SszType::Bitlist(10);
        let value = Value::Bits(Bitfield::from_bits(vec![true; 10]));
        assert_eq!(round_trip(&value, &ty), value);

        assert_eq!(
            decode(&[0xff, 0b0000_1111], &ty),
            Err(DecodeError::LimitExceeded { len: 11, limit: 10 })
        );
    }

    #[test]
    fn nested_limit_path() {
        let inner = SszType::container("Inner", vec![("bytes", u8_list(2))]).unwrap();
        let ty = SszType::container("Outer", vec![("inner", inner)]).unwrap();

        // Outer offset 4, inner offset 4, three bytes.
        let bytes = vec![4, 0, 0, 0, 4, 0, 0, 0, 1, 2, 3];
        let err = decode(&bytes, &ty).unwrap_err();
        assert_eq!(err.path(), "inner.bytes");
        assert_eq!(
            err.root_cause(),
            &DecodeError::LimitExceeded { len: 3, limit: 2 }
        );
    }
}

mod defaults {
    use super::*;

    #[test]
    fn default_values_round_trip() {
        let ty = SszType::container(
            "Everything",
            vec![
                ("a", SszType::U32),
                ("b", SszType::Bool),
                ("c", SszType::ByteVector(48)),
                ("d", SszType::Bitvector(4)),
                ("e", SszType::Bitlist(2048)),
                ("f", SszType::vector(SszType::ByteVector(32), 4).unwrap()),
                ("g", SszType::list(SszType::U64, 1 << 40).unwrap()),
            ],
        )
        .unwrap();

        let value = Value::default_for(&ty);
        let bytes = encode(&value, &ty).unwrap();
        // Fixed part + one bitlist delimiter byte.
        assert_eq!(bytes.len(), 4 + 1 + 48 + 1 + 4 + 128 + 4 + 1);
        assert_eq!(decode(&bytes, &ty), Ok(value));
    }
}

#[quickcheck]
fn quickcheck_u16_list(input: Vec<u16>) -> bool {
    let ty = SszType::list(SszType::U16, 1 << 20).unwrap();
    let value = Value::List(input.into_iter().map(|n| Value::Uint(n as u64)).collect());
    round_trip(&value, &ty) == value
}

#[quickcheck]
fn quickcheck_nested_lists(input: Vec<Vec<u8>>) -> bool {
    let ty = SszType::list(u8_list(1 << 16), 1 << 16).unwrap();
    let value = Value::List(
        input
            .iter()
            .map(|bytes| Value::List(u8_values(bytes)))
            .collect(),
    );
    round_trip(&value, &ty) == value
}

#[quickcheck]
fn quickcheck_container(a: u64, b: Vec<u8>, c: bool, d: Vec<bool>) -> bool {
    let ty = SszType::container(
        "Foo",
        vec![
            ("a", SszType::U64),
            ("b", u8_list(1 << 16)),
            ("c", SszType::Bool),
            ("d", SszType::Bitlist(1 << 16)),
        ],
    )
    .unwrap();
    let value = Value::Container(vec![
        Value::Uint(a),
        Value::List(u8_values(&b)),
        Value::Bool(c),
        Value::Bits(Bitfield::from_bits(d)),
    ]);
    round_trip(&value, &ty) == value
}

#[quickcheck]
fn quickcheck_decode_never_panics(bytes: Vec<u8>) -> bool {
    let ty = SszType::container(
        "Foo",
        vec![
            ("a", SszType::U16),
            ("b", SszType::list(u8_list(8), 8).unwrap()),
            ("c", SszType::Bitlist(16)),
        ],
    )
    .unwrap();

    // Any input either fails cleanly or re-encodes to exactly the same bytes.
    match decode(&bytes, &ty) {
        Ok(value) => encode(&value, &ty).map_or(false, |encoded| encoded == bytes),
        Err(_) => true,
    }
}

/// Generates tests which check that random instances of a record survive an SSZ round trip and
/// that their roots agree across hashing strategies, under both presets.
#[cfg(test)]
#[macro_export]
macro_rules! record_tests {
    ($kind: ident) => {
        fn schemas() -> Vec<&'static $crate::Schema> {
            vec![$crate::Schema::minimal(), $crate::Schema::mainnet()]
        }

        #[test]
        pub fn test_ssz_round_trip() {
            use $crate::test_utils::{random_value, SeedableRng, XorShiftRng};

            for schema in schemas() {
                let ty = schema.descriptor($crate::RecordKind::$kind);
                let mut rng = XorShiftRng::from_seed([42; 16]);

                for _ in 0..4 {
                    let original = random_value(ty, &mut rng);

                    let bytes = ssz::encode(&original, ty).expect("should encode");
                    assert_eq!(ssz::encoded_len(&original, ty), Ok(bytes.len()));
                    if let Some(len) = ty.ssz_fixed_len_opt() {
                        assert_eq!(bytes.len(), len);
                    }

                    let decoded = ssz::decode(&bytes, ty).expect("should decode");
                    assert_eq!(original, decoded);
                }
            }
        }

        #[test]
        pub fn test_tree_hash_root() {
            use $crate::test_utils::{random_value, SeedableRng, XorShiftRng};

            for schema in schemas() {
                let ty = schema.descriptor($crate::RecordKind::$kind);
                let mut rng = XorShiftRng::from_seed([42; 16]);
                let mut cache = tree_hash::CachedRoot::new(ty.clone());

                for _ in 0..2 {
                    let value = random_value(ty, &mut rng);
                    let root = tree_hash::hash_tree_root(&value, ty).expect("should hash");

                    assert_eq!(cache.recalculate(&value), Ok(root));

                    let first_field = ssz::PathSegment::Field(
                        ty.as_container().expect("records are containers").fields()[0]
                            .name()
                            .to_string(),
                    );
                    let proof = $crate::proof::generate_proof(&value, ty, &[first_field])
                        .expect("should generate proof");
                    assert!(proof.verify(root));
                }
            }
        }
    };
}

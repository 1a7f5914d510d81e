use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use types::{RecordKind, Schema, Value};

/// A mainnet state with `validator_count` default validators and balances.
fn get_state(validator_count: usize) -> Value {
    let schema = Schema::mainnet();
    let mut state = Value::default_for(schema.descriptor(RecordKind::BeaconState));
    let validator = Value::default_for(schema.descriptor(RecordKind::Validator));

    let fields = state.as_mut_slice().expect("state is a container");
    for i in 0..validator_count {
        let mut validator = validator.clone();
        if let Some(validator_fields) = validator.as_mut_slice() {
            validator_fields[1] = Value::bytes((i as u64).to_le_bytes().repeat(4));
            validator_fields[2] = Value::Uint(32_000_000_000);
        }
        fields[10].push(validator);
        fields[11].push(Value::Uint(i as u64));
    }

    state
}

fn all_benches(c: &mut Criterion) {
    let validator_count = 16_384;
    let ty = Schema::mainnet().descriptor(RecordKind::BeaconState);
    let state = get_state(validator_count);
    let state_bytes = ssz::encode(&state, ty).expect("should encode");

    let mut group = c.benchmark_group(format!("{}_validators", validator_count));
    group.sample_size(10);

    group.bench_function("encode/beacon_state", |b| {
        b.iter(|| black_box(ssz::encode(&state, ty).expect("should encode")))
    });

    group.bench_function("decode/beacon_state", |b| {
        b.iter(|| black_box(ssz::decode(&state_bytes, ty).expect("should decode")))
    });

    group.bench_function("tree_hash/beacon_state", |b| {
        b.iter(|| black_box(tree_hash::hash_tree_root(&state, ty).expect("should hash")))
    });

    let mut cache = tree_hash::CachedRoot::new(ty.clone());
    cache.recalculate(&state).expect("should hash");
    let mut updated = state.clone();
    if let Some(fields) = updated.as_mut_slice() {
        fields[1] = Value::Uint(1);
    }

    group.bench_function("cached_tree_hash/beacon_state_one_change", |b| {
        b.iter_batched_ref(
            || cache.clone(),
            |cache| black_box(cache.recalculate(&updated).expect("should hash")),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, all_benches);
criterion_main!(benches);

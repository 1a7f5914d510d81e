use super::*;
use ssz::{Bitfield, SszType, Value};

/// Returns a random value of `ty`, generated from a fixed seed.
pub fn test_random_instance(ty: &SszType) -> Value {
    let mut rng = XorShiftRng::from_seed([0x42; 16]);
    random_value(ty, &mut rng)
}

/// Returns a random value which conforms to `ty`.
///
/// Lists hold fewer than four elements (and bitlists fewer than 64 bits) so that random records
/// stay small regardless of their limits. Vectors are always filled.
pub fn random_value(ty: &SszType, rng: &mut impl RngCore) -> Value {
    match ty {
        SszType::Uint(num_bytes) => {
            let n = rng.next_u64();
            if *num_bytes >= 8 {
                Value::Uint(n)
            } else {
                Value::Uint(n & ((1 << (num_bytes * 8)) - 1))
            }
        }
        SszType::Bool => Value::Bool((rng.next_u32() % 2) == 1),
        SszType::ByteVector(len) => {
            let mut bytes = vec![0; *len];
            rng.fill_bytes(&mut bytes);
            Value::Bytes(bytes)
        }
        SszType::Bitvector(len) => Value::Bits(random_bits(*len, rng)),
        SszType::Bitlist(limit) => {
            let len = random_len(rng, std::cmp::min(64, *limit + 1));
            Value::Bits(random_bits(len, rng))
        }
        SszType::Vector(vector) => Value::Vector(
            (0..vector.len())
                .map(|_| random_value(vector.elem(), rng))
                .collect(),
        ),
        SszType::List(list) => {
            let len = random_len(rng, std::cmp::min(4, list.limit() + 1));
            Value::List((0..len).map(|_| random_value(list.elem(), rng)).collect())
        }
        SszType::Container(container) => Value::Container(
            container
                .fields()
                .iter()
                .map(|field| random_value(field.ty(), rng))
                .collect(),
        ),
    }
}

/// A random length in `0..bound`.
fn random_len(rng: &mut impl RngCore, bound: usize) -> usize {
    (rng.next_u32() as usize) % bound
}

fn random_bits(len: usize, rng: &mut impl RngCore) -> Bitfield {
    Bitfield::from_bits((0..len).map(|_| (rng.next_u32() % 2) == 1))
}

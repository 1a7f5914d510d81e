//! Checks that a `Value` conforms to the limits and lengths declared by its `SszType`.
//!
//! The same checks are applied by the encoder, the decoder and the tree hasher: a collection is
//! never silently truncated or padded to fit its type.
use crate::{EncodeError, SszType, Value};

/// Returned when a collection holds more elements than its type permits.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LimitExceeded {
    pub len: usize,
    pub limit: usize,
}

/// Returned when a fixed-length collection holds the wrong number of elements.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LengthMismatch {
    pub len: usize,
    pub expected: usize,
}

pub fn check_limit(len: usize, limit: usize) -> Result<(), LimitExceeded> {
    if len > limit {
        Err(LimitExceeded { len, limit })
    } else {
        Ok(())
    }
}

pub fn check_length(len: usize, expected: usize) -> Result<(), LengthMismatch> {
    if len != expected {
        Err(LengthMismatch { len, expected })
    } else {
        Ok(())
    }
}

/// Ensures `value` can be represented in `num_bytes` bytes.
pub fn check_uint(value: u64, num_bytes: usize) -> Result<(), EncodeError> {
    if num_bytes < 8 && value >> (num_bytes * 8) != 0 {
        Err(EncodeError::ValueOutOfRange { value, num_bytes })
    } else {
        Ok(())
    }
}

/// Checks the entire tree of `value` against `ty`, without serializing it.
pub fn validate(value: &Value, ty: &SszType) -> Result<(), EncodeError> {
    match (ty, value) {
        (SszType::Uint(num_bytes), Value::Uint(n)) => check_uint(*n, *num_bytes),
        (SszType::Bool, Value::Bool(_)) => Ok(()),
        (SszType::ByteVector(len), Value::Bytes(bytes)) => Ok(check_length(bytes.len(), *len)?),
        (SszType::Bitvector(len), Value::Bits(bits)) => Ok(check_length(bits.len(), *len)?),
        (SszType::Bitlist(limit), Value::Bits(bits)) => Ok(check_limit(bits.len(), *limit)?),
        (SszType::Vector(vector), Value::Vector(values)) => {
            check_length(values.len(), vector.len())?;
            validate_elements(values, vector.elem())
        }
        (SszType::List(list), Value::List(values)) => {
            check_limit(values.len(), list.limit())?;
            validate_elements(values, list.elem())
        }
        (SszType::Container(container), Value::Container(values)) => {
            check_length(values.len(), container.fields().len())?;
            container
                .fields()
                .iter()
                .zip(values)
                .try_for_each(|(field, value)| {
                    validate(value, field.ty()).map_err(|e| e.in_field(field.name()))
                })
        }
        _ => Err(EncodeError::type_mismatch(ty, value)),
    }
}

fn validate_elements(values: &[Value], elem: &SszType) -> Result<(), EncodeError> {
    values
        .iter()
        .enumerate()
        .try_for_each(|(i, value)| validate(value, elem).map_err(|e| e.at_index(i)))
}

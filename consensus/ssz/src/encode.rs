use crate::path::render_path;
use crate::validate::{check_length, check_limit, check_uint, LengthMismatch, LimitExceeded};
use crate::{PathSegment, SszType, Value, BYTES_PER_LENGTH_OFFSET, MAX_LENGTH_VALUE};

/// Returned when a `Value` cannot be encoded (or hashed) as a given `SszType`.
///
/// A value built against its own descriptor never produces these; they indicate a value that
/// does not conform to the descriptor it was given.
#[derive(Debug, PartialEq, Clone)]
pub enum EncodeError {
    /// The value variant does not match the descriptor (e.g., a `Bool` given for a `uint64`).
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A fixed-length byte vector, bit vector, vector or container has the wrong length.
    InvalidLength { len: usize, expected: usize },
    /// A list or bitlist holds more items than its limit.
    LimitExceeded { len: usize, limit: usize },
    /// An integer does not fit in the declared number of bytes.
    ValueOutOfRange { value: u64, num_bytes: usize },
    /// The encoding is too large to be addressed by a 4-byte offset.
    OffsetOverflow(usize),
    /// The inner error occurred within the given field or element.
    InField {
        segment: PathSegment,
        error: Box<EncodeError>,
    },
}

impl EncodeError {
    pub(crate) fn type_mismatch(ty: &SszType, value: &Value) -> Self {
        EncodeError::TypeMismatch {
            expected: ty.kind_name(),
            found: value.kind_name(),
        }
    }

    /// Annotate `self` as having occurred within the container field `name`.
    pub fn in_field(self, name: &str) -> Self {
        EncodeError::InField {
            segment: PathSegment::Field(name.into()),
            error: Box::new(self),
        }
    }

    /// Annotate `self` as having occurred within element `i` of a vector or list.
    pub fn at_index(self, i: usize) -> Self {
        EncodeError::InField {
            segment: PathSegment::Index(i),
            error: Box::new(self),
        }
    }

    /// Returns the innermost error, stripping all path information.
    pub fn root_cause(&self) -> &Self {
        match self {
            EncodeError::InField { error, .. } => error.root_cause(),
            other => other,
        }
    }

    /// Returns the location of the innermost error, e.g. `body.attestations[3].signature`.
    pub fn path(&self) -> String {
        let mut segments = vec![];
        let mut error = self;
        while let EncodeError::InField { segment, error: inner } = error {
            segments.push(segment);
            error = inner;
        }
        render_path(segments.into_iter())
    }
}

impl From<LimitExceeded> for EncodeError {
    fn from(e: LimitExceeded) -> Self {
        EncodeError::LimitExceeded {
            len: e.len,
            limit: e.limit,
        }
    }
}

impl From<LengthMismatch> for EncodeError {
    fn from(e: LengthMismatch) -> Self {
        EncodeError::InvalidLength {
            len: e.len,
            expected: e.expected,
        }
    }
}

/// Allow for encoding an ordered series of distinct or indistinct items as SSZ bytes.
///
/// **You must call `finalize(..)` after the final `append(..)` call** to ensure the bytes are
/// written to `buf`.
///
/// ## Example
///
/// Use `SszEncoder` to produce identical output to `ssz::encode(..)` for a container:
///
/// ```rust
/// use ssz::{encode, SszEncoder, SszType, Value};
///
/// let a = SszType::U64;
/// let b = SszType::list(SszType::U16, 4).unwrap();
/// let foo = SszType::container("Foo", vec![("a", a.clone()), ("b", b.clone())]).unwrap();
///
/// let a_value = Value::Uint(42);
/// let b_value = Value::List(vec![Value::Uint(1), Value::Uint(3), Value::Uint(3), Value::Uint(7)]);
///
/// let mut buf: Vec<u8> = vec![];
/// let offset = a.ssz_fixed_len() + b.ssz_fixed_len();
///
/// let mut encoder = SszEncoder::container(&mut buf, offset);
/// encoder.append(&a_value, &a).unwrap();
/// encoder.append(&b_value, &b).unwrap();
/// encoder.finalize();
///
/// let value = Value::Container(vec![a_value, b_value]);
/// assert_eq!(buf, encode(&value, &foo).unwrap());
/// ```
pub struct SszEncoder<'a> {
    offset: usize,
    buf: &'a mut Vec<u8>,
    variable_bytes: Vec<u8>,
}

impl<'a> SszEncoder<'a> {
    /// Instantiate a new encoder for encoding a SSZ container or a sequence of variable-length
    /// items.
    ///
    /// `num_fixed_bytes` is the length of the fixed section, which is also the offset at which
    /// the first variable-length item will be written.
    pub fn container(buf: &'a mut Vec<u8>, num_fixed_bytes: usize) -> Self {
        buf.reserve(num_fixed_bytes);

        Self {
            offset: num_fixed_bytes,
            buf,
            variable_bytes: vec![],
        }
    }

    /// Append some `value` to the SSZ bytes.
    ///
    /// Fixed-length values are written in place. Variable-length values are represented in place
    /// by an offset and their bytes are held back until `finalize`.
    pub fn append(&mut self, value: &Value, ty: &SszType) -> Result<(), EncodeError> {
        if ty.is_fixed_len() {
            append_value(value, ty, self.buf)
        } else {
            let offset = self.offset + self.variable_bytes.len();
            self.buf.extend_from_slice(&encode_length(offset)?);
            append_value(value, ty, &mut self.variable_bytes)
        }
    }

    /// Write the variable bytes to `self.bytes`.
    ///
    /// This method must be called after the final `append(..)` call when serializing
    /// variable-length items.
    pub fn finalize(&mut self) -> &mut Vec<u8> {
        self.buf.append(&mut self.variable_bytes);

        self.buf
    }
}

/// Encode `value` as `ty`, returning the SSZ bytes.
pub fn encode(value: &Value, ty: &SszType) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(encoded_len(value, ty)?);
    append_value(value, ty, &mut buf)?;
    Ok(buf)
}

/// Encode `value` as `ty`, appending the SSZ bytes to `buf`.
///
/// On error, `buf` may contain a partial encoding.
pub fn encode_into(value: &Value, ty: &SszType, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    append_value(value, ty, buf)
}

/// Returns the number of bytes `value` encodes to as `ty`.
pub fn encoded_len(value: &Value, ty: &SszType) -> Result<usize, EncodeError> {
    if let Some(len) = ty.ssz_fixed_len_opt() {
        return Ok(len);
    }

    match (ty, value) {
        (SszType::Bitlist(_), Value::Bits(bits)) => Ok(bits.len() / 8 + 1),
        (SszType::Vector(vector), Value::Vector(values)) => {
            sequence_len(values, vector.elem())
        }
        (SszType::List(list), Value::List(values)) => sequence_len(values, list.elem()),
        (SszType::Container(container), Value::Container(values)) => {
            check_length(values.len(), container.fields().len())?;
            container
                .fields()
                .iter()
                .zip(values)
                .try_fold(container.fixed_part_len(), |acc, (field, value)| {
                    let len = if field.ty().is_fixed_len() {
                        0
                    } else {
                        encoded_len(value, field.ty()).map_err(|e| e.in_field(field.name()))?
                    };
                    Ok(acc + len)
                })
        }
        _ => Err(EncodeError::type_mismatch(ty, value)),
    }
}

fn sequence_len(values: &[Value], elem: &SszType) -> Result<usize, EncodeError> {
    match elem.ssz_fixed_len_opt() {
        Some(len) => Ok(len * values.len()),
        None => values.iter().enumerate().try_fold(0, |acc, (i, value)| {
            let len = encoded_len(value, elem).map_err(|e| e.at_index(i))?;
            Ok(acc + BYTES_PER_LENGTH_OFFSET + len)
        }),
    }
}

fn append_value(value: &Value, ty: &SszType, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (ty, value) {
        (SszType::Uint(num_bytes), Value::Uint(n)) => {
            check_uint(*n, *num_bytes)?;
            buf.extend_from_slice(&n.to_le_bytes()[0..*num_bytes]);
        }
        (SszType::Bool, Value::Bool(b)) => buf.push(*b as u8),
        (SszType::ByteVector(len), Value::Bytes(bytes)) => {
            check_length(bytes.len(), *len)?;
            buf.extend_from_slice(bytes);
        }
        (SszType::Bitvector(len), Value::Bits(bits)) => {
            check_length(bits.len(), *len)?;
            buf.extend_from_slice(bits.as_bytes());
        }
        (SszType::Bitlist(limit), Value::Bits(bits)) => {
            check_limit(bits.len(), *limit)?;
            buf.extend_from_slice(&bits.to_bitlist_bytes());
        }
        (SszType::Vector(vector), Value::Vector(values)) => {
            check_length(values.len(), vector.len())?;
            append_sequence(values, vector.elem(), buf)?;
        }
        (SszType::List(list), Value::List(values)) => {
            check_limit(values.len(), list.limit())?;
            append_sequence(values, list.elem(), buf)?;
        }
        (SszType::Container(container), Value::Container(values)) => {
            check_length(values.len(), container.fields().len())?;

            let mut encoder = SszEncoder::container(buf, container.fixed_part_len());
            for (field, value) in container.fields().iter().zip(values) {
                encoder
                    .append(value, field.ty())
                    .map_err(|e| e.in_field(field.name()))?;
            }
            encoder.finalize();
        }
        _ => return Err(EncodeError::type_mismatch(ty, value)),
    }

    Ok(())
}

/// Encode a sequence of elements (i.e., the contents of a vector or list).
///
/// Fixed-length elements are simply concatenated. Variable-length elements are preceded by one
/// offset per element, exactly as though they were the fields of a container.
fn append_sequence(values: &[Value], elem: &SszType, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    if let Some(len) = elem.ssz_fixed_len_opt() {
        buf.reserve(len * values.len());

        for (i, value) in values.iter().enumerate() {
            append_value(value, elem, buf).map_err(|e| e.at_index(i))?;
        }
    } else {
        let mut encoder = SszEncoder::container(buf, values.len() * BYTES_PER_LENGTH_OFFSET);

        for (i, value) in values.iter().enumerate() {
            encoder.append(value, elem).map_err(|e| e.at_index(i))?;
        }

        encoder.finalize();
    }

    Ok(())
}

/// Encode `len` as a little-endian byte array of `BYTES_PER_LENGTH_OFFSET` length.
///
/// Returns an error if `len` exceeds `MAX_LENGTH_VALUE`.
pub fn encode_length(len: usize) -> Result<[u8; BYTES_PER_LENGTH_OFFSET], EncodeError> {
    if len > MAX_LENGTH_VALUE {
        return Err(EncodeError::OffsetOverflow(len));
    }

    let mut bytes = [0; BYTES_PER_LENGTH_OFFSET];
    bytes.copy_from_slice(&len.to_le_bytes()[0..BYTES_PER_LENGTH_OFFSET]);
    Ok(bytes)
}

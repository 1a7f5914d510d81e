use crate::path::render_path;
use crate::validate::{check_limit, LimitExceeded};
use crate::{
    Bitfield, BitfieldError, ContainerType, PathSegment, SszType, Value, BYTES_PER_LENGTH_OFFSET,
};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;

type SmallVec8<T> = SmallVec<[T; 8]>;

/// The reason an offset was rejected.
///
/// The checks are derived from this document:
///
/// https://notes.ethereum.org/ruKvDXl6QOW3gnqVYb8ezA?view
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OffsetError {
    /// An offset points “backwards” into the fixed-bytes portion of the message, essentially
    /// double-decoding bytes that will also be decoded as fixed-length.
    IntoFixedPortion,
    /// The first offset does not point to the byte that follows the fixed byte portion,
    /// essentially skipping a variable-length byte.
    SkipsVariableBytes,
    /// An offset points to bytes prior to the previous offset. Depending on how you look at it,
    /// this either double-decodes bytes or makes the first offset a negative-length.
    Decreasing,
    /// An offset references byte indices that do not exist in the source bytes.
    OutOfBounds,
    /// The first offset of a sequence of variable-length items does not describe a whole number
    /// of offsets.
    NotMultipleOfOffsetSize,
}

/// Returned when SSZ decoding fails.
///
/// Decoding never panics and never allocates in proportion to a length that has not first been
/// checked against the descriptor's limit.
#[derive(Debug, PartialEq, Clone)]
pub enum DecodeError {
    /// The bytes supplied were too short to be decoded into the specified type.
    TooShort { len: usize, expected: usize },
    /// There were bytes remaining after the specified type was decoded.
    TrailingBytes { len: usize, expected: usize },
    /// A length offset was invalid.
    MalformedOffset { offset: usize, reason: OffsetError },
    /// A list or bitlist declares more items than its limit.
    LimitExceeded { len: usize, limit: usize },
    /// The padding bits of a bit vector are not zero, or a bitlist has no delimiter bit (in which
    /// case `last_byte` is the zero final byte, or zero for empty input).
    InvalidPadding { last_byte: u8 },
    /// A boolean byte was neither `0x00` nor `0x01`.
    InvalidBoolean(u8),
    /// The inner error occurred within the given field or element.
    InField {
        segment: PathSegment,
        error: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Annotate `self` as having occurred within the container field `name`.
    pub fn in_field(self, name: &str) -> Self {
        DecodeError::InField {
            segment: PathSegment::Field(name.into()),
            error: Box::new(self),
        }
    }

    /// Annotate `self` as having occurred within element `i` of a vector or list.
    pub fn at_index(self, i: usize) -> Self {
        DecodeError::InField {
            segment: PathSegment::Index(i),
            error: Box::new(self),
        }
    }

    /// Returns the innermost error, stripping all path information.
    pub fn root_cause(&self) -> &Self {
        match self {
            DecodeError::InField { error, .. } => error.root_cause(),
            other => other,
        }
    }

    /// Returns the location of the innermost error, e.g. `body.attestations[3].data`.
    ///
    /// Returns an empty string if the error occurred at the top level.
    pub fn path(&self) -> String {
        let mut segments = vec![];
        let mut error = self;
        while let DecodeError::InField { segment, error: inner } = error {
            segments.push(segment);
            error = inner;
        }
        render_path(segments.into_iter())
    }

    fn offset(offset: usize, reason: OffsetError) -> Self {
        DecodeError::MalformedOffset { offset, reason }
    }
}

impl From<LimitExceeded> for DecodeError {
    fn from(e: LimitExceeded) -> Self {
        DecodeError::LimitExceeded {
            len: e.len,
            limit: e.limit,
        }
    }
}

/// Performs checks on the `offset` based upon the other parameters provided.
///
/// ## Detail
///
/// - `offset`: the offset bytes (e.g., result of `read_offset(..)`).
/// - `previous_offset`: unless this is the first offset in the SSZ object, the value of the
/// previously-read offset. Used to ensure offsets are not decreasing.
/// - `num_bytes`: the total number of bytes in the SSZ object. Used to ensure the offset is not
/// out of bounds.
/// - `num_fixed_bytes`: the number of fixed-bytes in the struct, if it is known. Used to ensure
/// that the first offset doesn't skip any variable bytes.
pub fn sanitize_offset(
    offset: usize,
    previous_offset: Option<usize>,
    num_bytes: usize,
    num_fixed_bytes: Option<usize>,
) -> Result<usize, DecodeError> {
    if num_fixed_bytes.map_or(false, |fixed_bytes| offset < fixed_bytes) {
        Err(DecodeError::offset(offset, OffsetError::IntoFixedPortion))
    } else if previous_offset.is_none()
        && num_fixed_bytes.map_or(false, |fixed_bytes| offset != fixed_bytes)
    {
        Err(DecodeError::offset(offset, OffsetError::SkipsVariableBytes))
    } else if offset > num_bytes {
        Err(DecodeError::offset(offset, OffsetError::OutOfBounds))
    } else if previous_offset.map_or(false, |prev| prev > offset) {
        Err(DecodeError::offset(offset, OffsetError::Decreasing))
    } else {
        Ok(offset)
    }
}

#[derive(Copy, Clone, Debug)]
struct Offset {
    position: usize,
    offset: usize,
}

/// Builds an `SszDecoder`.
///
/// The purpose of this struct is to split some SSZ bytes into individual slices, one per item.
/// The builder is then converted into a `SszDecoder` which decodes those slices into values.
///
/// See [`SszDecoder`](struct.SszDecoder.html) for usage examples.
pub struct SszDecoderBuilder<'a> {
    bytes: &'a [u8],
    items: SmallVec8<&'a [u8]>,
    offsets: SmallVec8<Offset>,
    items_index: usize,
}

impl<'a> SszDecoderBuilder<'a> {
    /// Instantiate a new builder that should build a `SszDecoder` over the given `bytes` which
    /// are assumed to be the SSZ encoding of some container or sequence.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            items: smallvec![],
            offsets: smallvec![],
            items_index: 0,
        }
    }

    /// Declares that some value of type `ty` is the next item in `bytes`.
    pub fn register_type(&mut self, ty: &SszType) -> Result<(), DecodeError> {
        self.register_type_parameterized(ty.is_fixed_len(), ty.ssz_fixed_len())
    }

    /// Declares that a type with the given parameters is the next item in `bytes`.
    pub fn register_type_parameterized(
        &mut self,
        is_ssz_fixed_len: bool,
        ssz_fixed_len: usize,
    ) -> Result<(), DecodeError> {
        if is_ssz_fixed_len {
            let start = self.items_index;
            self.items_index += ssz_fixed_len;

            let slice =
                self.bytes
                    .get(start..self.items_index)
                    .ok_or(DecodeError::TooShort {
                        len: self.bytes.len(),
                        expected: self.items_index,
                    })?;

            self.items.push(slice);
        } else {
            let start = self.items_index;
            let offset_bytes = self
                .bytes
                .get(start..start + BYTES_PER_LENGTH_OFFSET)
                .ok_or(DecodeError::TooShort {
                    len: self.bytes.len(),
                    expected: start + BYTES_PER_LENGTH_OFFSET,
                })?;

            self.offsets.push(Offset {
                position: self.items.len(),
                offset: sanitize_offset(
                    read_offset(offset_bytes)?,
                    self.offsets.last().map(|o| o.offset),
                    self.bytes.len(),
                    None,
                )?,
            });

            // Push an empty slice into items; it will be replaced later.
            self.items.push(&[]);

            self.items_index += BYTES_PER_LENGTH_OFFSET;
        }

        Ok(())
    }

    fn finalize(&mut self) -> Result<(), DecodeError> {
        if let Some(first_offset) = self.offsets.first().map(|o| o.offset) {
            // Check to ensure the first offset points to the byte immediately following the
            // fixed-length bytes.
            match first_offset.cmp(&self.items_index) {
                Ordering::Less => {
                    return Err(DecodeError::offset(
                        first_offset,
                        OffsetError::IntoFixedPortion,
                    ))
                }
                Ordering::Greater => {
                    return Err(DecodeError::offset(
                        first_offset,
                        OffsetError::SkipsVariableBytes,
                    ))
                }
                Ordering::Equal => (),
            }

            // Iterate through each pair of offsets, grabbing the slice between each of the offsets.
            for pair in self.offsets.windows(2) {
                let a = pair[0];
                let b = pair[1];

                self.items[a.position] = &self.bytes[a.offset..b.offset];
            }

            // Handle the last offset, pushing a slice from it's start through to the end of
            // `self.bytes`.
            if let Some(last) = self.offsets.last() {
                self.items[last.position] = &self.bytes[last.offset..]
            }
        } else if self.items_index != self.bytes.len() {
            // If the container is fixed-length, ensure there are no excess bytes.
            return Err(DecodeError::TrailingBytes {
                len: self.bytes.len(),
                expected: self.items_index,
            });
        }

        Ok(())
    }

    /// Finalizes the builder, returning a `SszDecoder` that may be used to decode values.
    pub fn build(mut self) -> Result<SszDecoder<'a>, DecodeError> {
        self.finalize()?;

        Ok(SszDecoder {
            items: self.items,
            index: 0,
        })
    }
}

/// Decodes some slices of SSZ into values. Should be instantiated using
/// [`SszDecoderBuilder`](struct.SszDecoderBuilder.html).
///
/// ## Example
///
/// ```rust
/// use ssz::{encode, SszDecoderBuilder, SszType, Value};
///
/// let a = SszType::U64;
/// let b = SszType::list(SszType::U16, 4).unwrap();
/// let foo = SszType::container("Foo", vec![("a", a.clone()), ("b", b.clone())]).unwrap();
///
/// let value = Value::Container(vec![
///     Value::Uint(42),
///     Value::List(vec![Value::Uint(1), Value::Uint(3), Value::Uint(3), Value::Uint(7)]),
/// ]);
/// let bytes = encode(&value, &foo).unwrap();
///
/// let mut builder = SszDecoderBuilder::new(&bytes);
///
/// builder.register_type(&a).unwrap();
/// builder.register_type(&b).unwrap();
///
/// let mut decoder = builder.build().unwrap();
///
/// let decoded = Value::Container(vec![
///     decoder.decode_next(&a).unwrap(),
///     decoder.decode_next(&b).unwrap(),
/// ]);
///
/// assert_eq!(value, decoded);
/// ```
pub struct SszDecoder<'a> {
    items: SmallVec8<&'a [u8]>,
    index: usize,
}

impl<'a> SszDecoder<'a> {
    /// Decodes the next item as `ty`.
    ///
    /// # Panics
    ///
    /// Panics when attempting to decode more items than were registered.
    pub fn decode_next(&mut self, ty: &SszType) -> Result<Value, DecodeError> {
        self.decode_next_with(|slice| decode(slice, ty))
    }

    /// Decodes the next item using the provided function.
    pub fn decode_next_with<T, F>(&mut self, f: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&'a [u8]) -> Result<T, DecodeError>,
    {
        let slice = self.items[self.index];
        self.index += 1;
        f(slice)
    }
}

/// Decode `bytes` as `ty`.
///
/// The entire input must be consumed; see `DecodeError` for the rejected inputs.
pub fn decode(bytes: &[u8], ty: &SszType) -> Result<Value, DecodeError> {
    if let Some(expected) = ty.ssz_fixed_len_opt() {
        match bytes.len().cmp(&expected) {
            Ordering::Less => {
                return Err(DecodeError::TooShort {
                    len: bytes.len(),
                    expected,
                })
            }
            Ordering::Greater => {
                return Err(DecodeError::TrailingBytes {
                    len: bytes.len(),
                    expected,
                })
            }
            Ordering::Equal => (),
        }
    }

    match ty {
        SszType::Uint(num_bytes) => {
            let mut array = [0; 8];
            array[0..*num_bytes].copy_from_slice(bytes);
            Ok(Value::Uint(u64::from_le_bytes(array)))
        }
        SszType::Bool => match bytes[0] {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            byte => Err(DecodeError::InvalidBoolean(byte)),
        },
        SszType::ByteVector(_) => Ok(Value::Bytes(bytes.to_vec())),
        SszType::Bitvector(len) => Bitfield::from_bytes(bytes, *len)
            .map(Value::Bits)
            .map_err(|e| bitfield_error(e, bytes)),
        SszType::Bitlist(limit) => Bitfield::from_bitlist_bytes(bytes, *limit)
            .map(Value::Bits)
            .map_err(|e| bitfield_error(e, bytes)),
        SszType::Vector(vector) => {
            decode_sequence(bytes, vector.elem(), Some(vector.len())).map(Value::Vector)
        }
        SszType::List(list) => {
            let count = sequence_len(bytes, list.elem())?;
            check_limit(count, list.limit())?;
            decode_sequence(bytes, list.elem(), None).map(Value::List)
        }
        SszType::Container(container) => decode_container(bytes, container),
    }
}

fn bitfield_error(e: BitfieldError, bytes: &[u8]) -> DecodeError {
    match e {
        BitfieldError::LimitExceeded { len, limit } => DecodeError::LimitExceeded { len, limit },
        BitfieldError::ExcessBits { last_byte } => DecodeError::InvalidPadding { last_byte },
        BitfieldError::MissingLengthInformation => DecodeError::InvalidPadding {
            last_byte: bytes.last().copied().unwrap_or(0),
        },
        BitfieldError::InvalidByteCount { given, expected } => {
            if given < expected {
                DecodeError::TooShort {
                    len: given,
                    expected,
                }
            } else {
                DecodeError::TrailingBytes {
                    len: given,
                    expected,
                }
            }
        }
        BitfieldError::OutOfBounds { i, len } => DecodeError::TooShort {
            len,
            expected: i + 1,
        },
    }
}

/// Returns the number of elements encoded in `bytes`, without decoding any of them.
///
/// For variable-length elements the count is read from the first offset, which must be a
/// non-zero multiple of `BYTES_PER_LENGTH_OFFSET` within the bounds of `bytes`.
fn sequence_len(bytes: &[u8], elem: &SszType) -> Result<usize, DecodeError> {
    if bytes.is_empty() {
        return Ok(0);
    }

    match elem.ssz_fixed_len_opt() {
        Some(elem_len) => {
            if bytes.len() % elem_len != 0 {
                Err(DecodeError::TrailingBytes {
                    len: bytes.len(),
                    expected: bytes.len() - bytes.len() % elem_len,
                })
            } else {
                Ok(bytes.len() / elem_len)
            }
        }
        None => {
            let first_offset = read_offset(bytes)?;

            if first_offset == 0 {
                Err(DecodeError::offset(
                    first_offset,
                    OffsetError::IntoFixedPortion,
                ))
            } else if first_offset % BYTES_PER_LENGTH_OFFSET != 0 {
                Err(DecodeError::offset(
                    first_offset,
                    OffsetError::NotMultipleOfOffsetSize,
                ))
            } else if first_offset > bytes.len() {
                Err(DecodeError::offset(first_offset, OffsetError::OutOfBounds))
            } else {
                Ok(first_offset / BYTES_PER_LENGTH_OFFSET)
            }
        }
    }
}

/// Decode the contents of a vector (when `expected_len` is `Some`) or list.
fn decode_sequence(
    bytes: &[u8],
    elem: &SszType,
    expected_len: Option<usize>,
) -> Result<Vec<Value>, DecodeError> {
    let count = match (elem.ssz_fixed_len_opt(), expected_len) {
        // A fixed-length vector has had its total length checked by `decode`.
        (Some(_), Some(len)) => len,
        (None, Some(len)) => {
            let fixed_part_len = len * BYTES_PER_LENGTH_OFFSET;
            if bytes.len() < fixed_part_len {
                return Err(DecodeError::TooShort {
                    len: bytes.len(),
                    expected: fixed_part_len,
                });
            }
            len
        }
        (_, None) => sequence_len(bytes, elem)?,
    };

    if let Some(elem_len) = elem.ssz_fixed_len_opt() {
        return bytes
            .chunks(elem_len)
            .enumerate()
            .map(|(i, chunk)| decode(chunk, elem).map_err(|e| e.at_index(i)))
            .collect();
    }

    let mut builder = SszDecoderBuilder::new(bytes);
    for i in 0..count {
        builder
            .register_type_parameterized(false, BYTES_PER_LENGTH_OFFSET)
            .map_err(|e| e.at_index(i))?;
    }
    let mut decoder = builder.build()?;

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        values.push(decoder.decode_next(elem).map_err(|e| e.at_index(i))?);
    }

    Ok(values)
}

fn decode_container(bytes: &[u8], container: &ContainerType) -> Result<Value, DecodeError> {
    let mut builder = SszDecoderBuilder::new(bytes);

    for field in container.fields() {
        builder
            .register_type(field.ty())
            .map_err(|e| e.in_field(field.name()))?;
    }

    let mut decoder = builder.build()?;

    container
        .fields()
        .iter()
        .map(|field| {
            decoder
                .decode_next(field.ty())
                .map_err(|e| e.in_field(field.name()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Container)
}

/// Reads a `BYTES_PER_LENGTH_OFFSET`-byte length from `bytes`, where `bytes.len() >=
/// BYTES_PER_LENGTH_OFFSET`.
pub fn read_offset(bytes: &[u8]) -> Result<usize, DecodeError> {
    decode_offset(
        bytes
            .get(0..BYTES_PER_LENGTH_OFFSET)
            .ok_or(DecodeError::TooShort {
                len: bytes.len(),
                expected: BYTES_PER_LENGTH_OFFSET,
            })?,
    )
}

/// Decode bytes as a little-endian usize, returning an `Err` if `bytes.len() !=
/// BYTES_PER_LENGTH_OFFSET`.
fn decode_offset(bytes: &[u8]) -> Result<usize, DecodeError> {
    let len = bytes.len();
    let expected = BYTES_PER_LENGTH_OFFSET;

    if len != expected {
        Err(DecodeError::TooShort { len, expected })
    } else {
        let mut array: [u8; BYTES_PER_LENGTH_OFFSET] = std::default::Default::default();
        array.clone_from_slice(bytes);

        Ok(u32::from_le_bytes(array) as usize)
    }
}

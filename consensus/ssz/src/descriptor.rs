use crate::{BYTES_PER_LENGTH_OFFSET, MAX_LIST_LIMIT};
use std::collections::HashSet;
use std::sync::Arc;

/// Returned when a descriptor describes a shape that cannot be serialized.
///
/// These errors are raised while building descriptors (i.e., at setup) and are never the result
/// of untrusted input.
#[derive(Debug, PartialEq, Clone)]
pub enum ConfigError {
    /// Unsigned integers must be 1, 2, 4 or 8 bytes.
    InvalidUintSize(usize),
    /// A byte vector, bit vector or vector was declared with a length of zero.
    ZeroLength { kind: &'static str },
    /// A list or bitlist was declared without a limit (i.e., unbounded).
    ZeroLimit { kind: &'static str },
    /// The declared limit or length cannot be represented or merkleized.
    LimitTooLarge { kind: &'static str, limit: usize },
    /// A container was declared with no fields.
    EmptyContainer { name: String },
    /// A container declares two fields with the same name.
    DuplicateField { container: String, field: String },
}

/// Describes the shape of some SSZ value.
///
/// Composite shapes are reference-counted so that a single descriptor (e.g., `Checkpoint`) may
/// be nested inside many parents without being copied.
#[derive(Debug, PartialEq, Clone)]
pub enum SszType {
    /// An unsigned integer of the given number of bytes, little-endian.
    Uint(usize),
    /// A single byte, `0x00` or `0x01`.
    Bool,
    /// A byte array of exactly the given length.
    ByteVector(usize),
    /// A bit array of exactly the given bit length.
    Bitvector(usize),
    /// A bit array of at most the given bit length.
    Bitlist(usize),
    Vector(Arc<VectorType>),
    List(Arc<ListType>),
    Container(Arc<ContainerType>),
}

impl SszType {
    pub const U8: SszType = SszType::Uint(1);
    pub const U16: SszType = SszType::Uint(2);
    pub const U32: SszType = SszType::Uint(4);
    pub const U64: SszType = SszType::Uint(8);

    pub fn uint(num_bytes: usize) -> Result<Self, ConfigError> {
        let ty = SszType::Uint(num_bytes);
        ty.validate()?;
        Ok(ty)
    }

    pub fn byte_vector(len: usize) -> Result<Self, ConfigError> {
        let ty = SszType::ByteVector(len);
        ty.validate()?;
        Ok(ty)
    }

    pub fn bitvector(len: usize) -> Result<Self, ConfigError> {
        let ty = SszType::Bitvector(len);
        ty.validate()?;
        Ok(ty)
    }

    pub fn bitlist(limit: usize) -> Result<Self, ConfigError> {
        let ty = SszType::Bitlist(limit);
        ty.validate()?;
        Ok(ty)
    }

    pub fn vector(elem: SszType, len: usize) -> Result<Self, ConfigError> {
        VectorType::new(elem, len).map(SszType::Vector)
    }

    pub fn list(elem: SszType, limit: usize) -> Result<Self, ConfigError> {
        ListType::new(elem, limit).map(SszType::List)
    }

    pub fn container<I, S>(name: &str, fields: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, SszType)>,
        S: Into<String>,
    {
        ContainerType::new(name, fields).map(SszType::Container)
    }

    /// Checks the parameters of this shape.
    ///
    /// Composite shapes check their children when they are constructed, so only the leaf shapes
    /// (which may be built directly from their enum variants) need to be checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SszType::Uint(n) => match n {
                1 | 2 | 4 | 8 => Ok(()),
                _ => Err(ConfigError::InvalidUintSize(*n)),
            },
            SszType::Bool => Ok(()),
            SszType::ByteVector(0) | SszType::Bitvector(0) => Err(ConfigError::ZeroLength {
                kind: self.kind_name(),
            }),
            SszType::ByteVector(len) | SszType::Bitvector(len) => {
                if *len > crate::MAX_LENGTH_VALUE {
                    Err(ConfigError::LimitTooLarge {
                        kind: self.kind_name(),
                        limit: *len,
                    })
                } else {
                    Ok(())
                }
            }
            SszType::Bitlist(limit) => check_limit(self.kind_name(), *limit),
            SszType::Vector(_) | SszType::List(_) | SszType::Container(_) => Ok(()),
        }
    }

    /// Returns `true` if every instance of this type serializes to the same number of bytes.
    ///
    /// This is a static property of the descriptor, computed once when composite descriptors are
    /// built.
    pub fn is_fixed_len(&self) -> bool {
        self.ssz_fixed_len_opt().is_some()
    }

    /// The number of bytes this type occupies in the fixed section of a parent.
    ///
    /// For variable-length types this is the size of an offset.
    pub fn ssz_fixed_len(&self) -> usize {
        self.ssz_fixed_len_opt()
            .unwrap_or(BYTES_PER_LENGTH_OFFSET)
    }

    /// Returns `Some(len)` if all instances of this type serialize to exactly `len` bytes.
    pub fn ssz_fixed_len_opt(&self) -> Option<usize> {
        match self {
            SszType::Uint(n) => Some(*n),
            SszType::Bool => Some(1),
            SszType::ByteVector(len) => Some(*len),
            SszType::Bitvector(len) => Some(bytes_for_bit_len(*len)),
            SszType::Bitlist(_) | SszType::List(_) => None,
            SszType::Vector(vector) => vector.fixed_len,
            SszType::Container(container) => container.fixed_len,
        }
    }

    /// Returns `true` for the shapes that are packed together when merkleized (i.e., integers
    /// and booleans).
    pub fn is_basic(&self) -> bool {
        matches!(self, SszType::Uint(_) | SszType::Bool)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SszType::Uint(_) => "uint",
            SszType::Bool => "bool",
            SszType::ByteVector(_) => "byte_vector",
            SszType::Bitvector(_) => "bitvector",
            SszType::Bitlist(_) => "bitlist",
            SszType::Vector(_) => "vector",
            SszType::List(_) => "list",
            SszType::Container(_) => "container",
        }
    }

    pub fn as_container(&self) -> Option<&ContainerType> {
        match self {
            SszType::Container(container) => Some(container),
            _ => None,
        }
    }
}

/// A fixed-count sequence of a single element type.
#[derive(Debug, PartialEq, Clone)]
pub struct VectorType {
    elem: SszType,
    len: usize,
    fixed_len: Option<usize>,
}

impl VectorType {
    pub fn new(elem: SszType, len: usize) -> Result<Arc<Self>, ConfigError> {
        elem.validate()?;

        if len == 0 {
            return Err(ConfigError::ZeroLength { kind: "vector" });
        }
        check_limit("vector", len)?;

        let fixed_len = match elem.ssz_fixed_len_opt() {
            Some(elem_len) => Some(
                elem_len
                    .checked_mul(len)
                    .filter(|total| *total <= crate::MAX_LENGTH_VALUE)
                    .ok_or(ConfigError::LimitTooLarge {
                        kind: "vector",
                        limit: len,
                    })?,
            ),
            None => None,
        };

        Ok(Arc::new(Self {
            elem,
            len,
            fixed_len,
        }))
    }

    pub fn elem(&self) -> &SszType {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// A variable-count sequence of a single element type, bounded by `limit`.
#[derive(Debug, PartialEq, Clone)]
pub struct ListType {
    elem: SszType,
    limit: usize,
}

impl ListType {
    pub fn new(elem: SszType, limit: usize) -> Result<Arc<Self>, ConfigError> {
        elem.validate()?;
        check_limit("list", limit)?;

        // The packed representation of a full list must be addressable.
        if let Some(elem_len) = elem.ssz_fixed_len_opt() {
            elem_len
                .checked_mul(limit)
                .ok_or(ConfigError::LimitTooLarge {
                    kind: "list",
                    limit,
                })?;
        }

        Ok(Arc::new(Self { elem, limit }))
    }

    pub fn elem(&self) -> &SszType {
        &self.elem
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// A named member of a container.
#[derive(Debug, PartialEq, Clone)]
pub struct Field {
    name: String,
    ty: SszType,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &SszType {
        &self.ty
    }
}

/// An ordered set of named fields.
///
/// Field order is part of the type: it determines both the serialized layout and the order of
/// leaves when merkleizing.
#[derive(Debug, PartialEq, Clone)]
pub struct ContainerType {
    name: String,
    fields: Vec<Field>,
    fixed_len: Option<usize>,
    fixed_part_len: usize,
}

impl ContainerType {
    pub fn new<I, S>(name: &str, fields: I) -> Result<Arc<Self>, ConfigError>
    where
        I: IntoIterator<Item = (S, SszType)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(field_name, ty)| Field {
                name: field_name.into(),
                ty,
            })
            .collect::<Vec<_>>();

        if fields.is_empty() {
            return Err(ConfigError::EmptyContainer { name: name.into() });
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            field.ty.validate()?;

            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    container: name.into(),
                    field: field.name.clone(),
                });
            }
        }

        let fixed_part_len = fields
            .iter()
            .try_fold(0_usize, |acc, field| acc.checked_add(field.ty.ssz_fixed_len()))
            .filter(|len| *len <= crate::MAX_LENGTH_VALUE)
            .ok_or(ConfigError::LimitTooLarge {
                kind: "container",
                limit: fields.len(),
            })?;

        let fixed_len = if fields.iter().all(|field| field.ty.is_fixed_len()) {
            Some(fixed_part_len)
        } else {
            None
        };

        Ok(Arc::new(Self {
            name: name.into(),
            fields,
            fixed_len,
            fixed_part_len,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The length of the fixed section: all fixed-length fields plus one offset per
    /// variable-length field.
    pub fn fixed_part_len(&self) -> usize {
        self.fixed_part_len
    }

    pub fn is_fixed_len(&self) -> bool {
        self.fixed_len.is_some()
    }
}

/// The number of bytes required to store `bit_len` bits.
pub(crate) fn bytes_for_bit_len(bit_len: usize) -> usize {
    (bit_len + 7) / 8
}

fn check_limit(kind: &'static str, limit: usize) -> Result<(), ConfigError> {
    if limit == 0 {
        Err(ConfigError::ZeroLimit { kind })
    } else if limit as u64 > MAX_LIST_LIMIT {
        Err(ConfigError::LimitTooLarge { kind, limit })
    } else {
        Ok(())
    }
}

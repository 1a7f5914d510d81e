use crate::{Bitfield, ContainerType, SszType};

/// An in-memory record tree, interpreted against an `SszType`.
///
/// A `Value` carries no type information of its own beyond its variant: the same `Value::Uint`
/// may be a `uint8` or a `uint64` depending on the descriptor it is encoded with. Container
/// fields are positional, in the order declared by the `ContainerType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Uint(u64),
    Bool(bool),
    /// The contents of a `ByteVector`.
    Bytes(Vec<u8>),
    /// The contents of a `Bitvector` or `Bitlist`.
    Bits(Bitfield),
    Vector(Vec<Value>),
    List(Vec<Value>),
    Container(Vec<Value>),
}

impl Value {
    /// Returns the default (all-zero) value of `ty`.
    ///
    /// Lists and bitlists are empty; everything else is zeroed at its fixed length.
    pub fn default_for(ty: &SszType) -> Self {
        match ty {
            SszType::Uint(_) => Value::Uint(0),
            SszType::Bool => Value::Bool(false),
            SszType::ByteVector(len) => Value::Bytes(vec![0; *len]),
            SszType::Bitvector(len) => Value::Bits(Bitfield::with_len(*len)),
            SszType::Bitlist(_) => Value::Bits(Bitfield::default()),
            SszType::Vector(vector) => {
                Value::Vector(vec![Value::default_for(vector.elem()); vector.len()])
            }
            SszType::List(_) => Value::List(vec![]),
            SszType::Container(container) => Value::Container(
                container
                    .fields()
                    .iter()
                    .map(|field| Value::default_for(field.ty()))
                    .collect(),
            ),
        }
    }

    pub fn bytes<T: Into<Vec<u8>>>(bytes: T) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::Bits(_) => "bits",
            Value::Vector(_) => "vector",
            Value::List(_) => "list",
            Value::Container(_) => "container",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<&Bitfield> {
        match self {
            Value::Bits(bits) => Some(bits),
            _ => None,
        }
    }

    /// The children of a vector, list or container.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(values) | Value::List(values) | Value::Container(values) => Some(values),
            _ => None,
        }
    }

    /// Mutable access to the children of a vector, list or container.
    ///
    /// Only lists may change length; see `push`.
    pub fn as_mut_slice(&mut self) -> Option<&mut [Value]> {
        match self {
            Value::Vector(values) | Value::List(values) | Value::Container(values) => {
                Some(values)
            }
            _ => None,
        }
    }

    /// Appends to a list. Returns `false` if `self` is not a list.
    ///
    /// The list limit is not checked here; an over-long list is rejected when it is encoded or
    /// hashed.
    pub fn push(&mut self, value: Value) -> bool {
        match self {
            Value::List(values) => {
                values.push(value);
                true
            }
            _ => false,
        }
    }

    /// Returns the field `name` of a container value described by `container`.
    pub fn field<'a>(&'a self, container: &ContainerType, name: &str) -> Option<&'a Value> {
        let index = container.field_index(name)?;
        match self {
            Value::Container(values) => values.get(index),
            _ => None,
        }
    }

    pub fn field_mut<'a>(
        &'a mut self,
        container: &ContainerType,
        name: &str,
    ) -> Option<&'a mut Value> {
        let index = container.field_index(name)?;
        match self {
            Value::Container(values) => values.get_mut(index),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Bitfield> for Value {
    fn from(bits: Bitfield) -> Self {
        Value::Bits(bits)
    }
}

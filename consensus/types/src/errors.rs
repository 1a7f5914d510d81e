use merkle_proof::MerkleTreeError;
use ssz::{ConfigError, DecodeError, EncodeError};

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// No record of this name exists in the schema.
    UnknownRecord(String),
    /// A path named a field which the container does not declare.
    UnknownField { container: String, field: String },
    /// A path indexed beyond the end of a vector or list.
    IndexOutOfBounds { index: usize, len: usize },
    /// A path cannot be followed through the value (e.g., it indexes into a scalar).
    InvalidPath(String),
    /// The requested proof is too deep to be indexed by a `u64`.
    ProofTooDeep { depth: usize },
    Config(ConfigError),
    Encode(EncodeError),
    Decode(DecodeError),
    TreeHash(tree_hash::Error),
    MerkleTree(MerkleTreeError),
}

impl Error {
    /// The path within the record at which an encode or decode error occurred, if any.
    pub fn path(&self) -> Option<String> {
        match self {
            Error::Encode(e) | Error::TreeHash(tree_hash::Error::InvalidValue(e)) => {
                Some(e.path())
            }
            Error::Decode(e) => Some(e.path()),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Error {
        Error::Config(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Error {
        Error::Encode(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Error {
        Error::Decode(e)
    }
}

impl From<tree_hash::Error> for Error {
    fn from(e: tree_hash::Error) -> Error {
        Error::TreeHash(e)
    }
}

impl From<MerkleTreeError> for Error {
    fn from(e: MerkleTreeError) -> Error {
        Error::MerkleTree(e)
    }
}

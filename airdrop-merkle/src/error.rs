use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleTreeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Leaf index {index} is out of range for tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    #[error("Leaf is not in tree")]
    LeafNotInTree,

    #[error("Merkle tree nodes must be 32 bytes")]
    InvalidNodeLength,

    #[error("Hex decode error: {0}")]
    HexDecode(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for MerkleTreeError {
    fn from(e: serde_json::Error) -> Self {
        MerkleTreeError::Json(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MerkleTreeError>;

#[inline]
pub fn validate_input<T: AsRef<str>>(condition: bool, message: T) -> Result<()> {
    if !condition {
        Err(MerkleTreeError::InvalidInput(message.as_ref().to_string()))
    } else {
        Ok(())
    }
}

#[inline]
pub fn invariant<T: AsRef<str>>(condition: bool, message: T) -> Result<()> {
    if !condition {
        Err(MerkleTreeError::Invariant(message.as_ref().to_string()))
    } else {
        Ok(())
    }
}

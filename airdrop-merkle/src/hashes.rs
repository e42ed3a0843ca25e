use crate::bytes::{Bytes32, concat, concat_sorted};
use crate::error::MerkleTreeError;
use crate::options::MerkleTreeOptions;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Tag prepended to leaf data when domain separation is enabled.
pub const LEAF_PREFIX: u8 = 0x00;
/// Tag prepended to `left ‖ right` when domain separation is enabled.
pub const NODE_PREFIX: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Keccak256,
}

impl HashAlgorithm {
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Bytes32 {
        self.digest_parts(&[data])
    }

    /// Hashes the concatenation of `parts` without materializing it.
    #[must_use]
    pub fn digest_parts(self, parts: &[&[u8]]) -> Bytes32 {
        match self {
            HashAlgorithm::Sha256 => finalize(parts, Sha256::new()),
            HashAlgorithm::Keccak256 => finalize(parts, Keccak256::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Keccak256 => "keccak256",
        }
    }
}

fn finalize<D: Digest>(parts: &[&[u8]], mut hasher: D) -> Bytes32 {
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = MerkleTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "keccak256" | "keccak-256" => Ok(HashAlgorithm::Keccak256),
            other => Err(MerkleTreeError::UnknownFormat(format!(
                "hash algorithm '{other}'"
            ))),
        }
    }
}

#[must_use]
pub fn sha256(data: &[u8]) -> Bytes32 {
    HashAlgorithm::Sha256.digest(data)
}

#[must_use]
pub fn keccak256(data: &[u8]) -> Bytes32 {
    HashAlgorithm::Keccak256.digest(data)
}

/// Hashes one encoded record into a leaf.
#[must_use]
pub fn leaf_hash(data: &[u8], options: &MerkleTreeOptions) -> Bytes32 {
    if options.domain_separation {
        let prefix: &[u8] = &[LEAF_PREFIX];
        options.hash.digest_parts(&[prefix, data])
    } else {
        options.hash.digest(data)
    }
}

/// Hashes two children into their parent. `left` and `right` are taken in
/// tree order; with `sort_pairs` set the smaller hash goes first instead.
#[must_use]
pub fn node_hash(left: &Bytes32, right: &Bytes32, options: &MerkleTreeOptions) -> Bytes32 {
    let pair = if options.sort_pairs {
        concat_sorted(left, right)
    } else {
        concat(left, right)
    };
    if options.domain_separation {
        let prefix: &[u8] = &[NODE_PREFIX];
        options.hash.digest_parts(&[prefix, &pair])
    } else {
        options.hash.digest(&pair)
    }
}

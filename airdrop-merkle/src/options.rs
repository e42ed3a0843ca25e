use crate::hashes::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Levels with fewer nodes than this are hashed on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 14;

/// Hashing and construction settings for a tree.
///
/// The first three fields change the root and must match whatever verifier
/// consumes the proofs. `parallel_threshold` only affects how the tree is
/// built, never its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleTreeOptions {
    pub hash: HashAlgorithm,
    /// Prefix leaves with `0x00` and nodes with `0x01` before hashing.
    pub domain_separation: bool,
    /// Hash each pair smallest first instead of in tree order.
    pub sort_pairs: bool,
    #[serde(skip, default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl Default for MerkleTreeOptions {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::default(),
            domain_separation: false,
            sort_pairs: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl MerkleTreeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_domain_separation(mut self, enabled: bool) -> Self {
        self.domain_separation = enabled;
        self
    }

    pub fn with_sort_pairs(mut self, sort: bool) -> Self {
        self.sort_pairs = sort;
        self
    }

    /// `usize::MAX` keeps construction single threaded.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(2);
        self
    }

    /// Ethereum flavour: Keccak-256 with commutative pair hashing, as
    /// checked by OpenZeppelin's `MerkleProof.verify`.
    pub fn evm_sorted() -> Self {
        Self::default()
            .with_hash(HashAlgorithm::Keccak256)
            .with_sort_pairs(true)
    }
}

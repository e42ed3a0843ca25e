//! Inclusion proofs and tree-independent verification.
//!
//! Each proof step records which side of the running hash its sibling sits
//! on, so a verifier hashes every pair in the same order the tree did.

use crate::bytes::{Bytes32, HexString, bytes32_to_hex, hex32};
use crate::error::Result;
use crate::hashes::node_hash;
use crate::options::MerkleTreeOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side of the sibling of the node at `index` within its level.
    #[inline]
    #[must_use]
    pub fn of_sibling(index: usize) -> Self {
        if index % 2 == 0 {
            Side::Right
        } else {
            Side::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofStep {
    #[serde(with = "hex32")]
    pub hash: Bytes32,
    pub side: Side,
}

impl ProofStep {
    /// Combines the running hash with this step's sibling.
    #[inline]
    #[must_use]
    pub fn apply(&self, current: &Bytes32, options: &MerkleTreeOptions) -> Bytes32 {
        match self.side {
            Side::Right => node_hash(current, &self.hash, options),
            Side::Left => node_hash(&self.hash, current, options),
        }
    }
}

/// Sibling path from one leaf up to the root, one step per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sibling hashes without their sides.
    pub fn hashes(&self) -> Vec<Bytes32> {
        self.steps.iter().map(|step| step.hash).collect()
    }

    /// Sibling hashes as `0x`-prefixed hex, in the form claim contracts take.
    pub fn to_hex(&self) -> Vec<HexString> {
        self.steps.iter().map(|step| bytes32_to_hex(&step.hash)).collect()
    }

    /// Recomputes the root this proof commits `leaf_hash` to.
    #[must_use]
    pub fn compute_root(&self, leaf_hash: &Bytes32, options: &MerkleTreeOptions) -> Bytes32 {
        process_proof(leaf_hash, &self.steps, options)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[must_use]
pub fn process_proof(
    leaf_hash: &Bytes32,
    steps: &[ProofStep],
    options: &MerkleTreeOptions,
) -> Bytes32 {
    steps
        .iter()
        .fold(*leaf_hash, |current, step| step.apply(&current, options))
}

/// Checks that `proof` links `leaf_hash` to `expected_root`.
///
/// A mismatch is an ordinary outcome and yields `false`.
#[must_use]
pub fn verify(
    leaf_hash: &Bytes32,
    proof: &MerkleProof,
    expected_root: &Bytes32,
    options: &MerkleTreeOptions,
) -> bool {
    proof.compute_root(leaf_hash, options) == *expected_root
}

/// Like [`verify`] for a bare sibling list; sides come from the bits of
/// `leaf_index`, lowest bit first.
#[must_use]
pub fn verify_hashes(
    leaf_hash: &Bytes32,
    siblings: &[Bytes32],
    leaf_index: usize,
    expected_root: &Bytes32,
    options: &MerkleTreeOptions,
) -> bool {
    if siblings.len() < usize::BITS as usize && leaf_index >> siblings.len() != 0 {
        return false;
    }
    let steps: Vec<ProofStep> = siblings
        .iter()
        .enumerate()
        .map(|(level, hash)| ProofStep {
            hash: *hash,
            side: Side::of_sibling(leaf_index.checked_shr(level as u32).unwrap_or(0)),
        })
        .collect();
    process_proof(leaf_hash, &steps, options) == *expected_root
}

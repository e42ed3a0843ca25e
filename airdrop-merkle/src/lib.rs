//! # airdrop-merkle
//!
//! Merkle tree construction, inclusion proofs and verification for token
//! airdrop campaigns.
//!
//! A campaign's recipient list is hashed into an ordered leaf set and folded
//! into a single root that gets published on-chain. Each claimant receives
//! the proof for their leaf, which anyone can check against the root without
//! the rest of the tree.
//!
//! ## Features
//!
//! - **`MerkleTree`**: order-preserving binary tree; an odd level pairs its
//!   last node with itself
//! - **`MerkleProof`**: sibling path with the side of every sibling recorded
//! - **`verify`**: tree-independent proof check, never errors
//! - **`Allocation`**: `abi.encodePacked(address, uint256)` leaf encoding
//! - SHA-256 (default) or Keccak-256, optional leaf/node domain separation
//! - Parallel level construction for large campaigns (rayon)
//! - Dump/load with serde and a caller-owned `TreeCache`
//!
//! ## Example
//!
//! ```rust
//! use airdrop_merkle::{MerkleTree, MerkleTreeOptions, sha256, verify};
//!
//! let records = ["alice:100", "bob:200", "carol:150"];
//! let tree = MerkleTree::build(&records, MerkleTreeOptions::default()).unwrap();
//!
//! let proof = tree.proof(1).unwrap();
//! assert_eq!(proof.len(), 2);
//! assert!(verify(&sha256(b"bob:200"), &proof, tree.root(), tree.options()));
//! ```

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod bytes;
pub mod cache;
pub mod error;
pub mod hashes;
pub mod leaf;
pub mod options;
pub mod proof;
pub mod tree;

pub use bytes::{Bytes32, HexString, bytes32_to_hex, hex_to_bytes32};
pub use cache::TreeCache;
pub use error::{MerkleTreeError, Result};
pub use hashes::{HashAlgorithm, keccak256, leaf_hash, node_hash, sha256};
pub use leaf::{Allocation, ToLeafBytes, parse_allocations};
pub use options::MerkleTreeOptions;
pub use proof::{MerkleProof, ProofStep, Side, process_proof, verify, verify_hashes};
pub use tree::{MerkleTree, MerkleTreeData, ZERO_ROOT, compute_root};

use crate::bytes::{Bytes32, HexString, bytes32_to_hex, hex32, hex32_vec};
use crate::error::{MerkleTreeError, Result, invariant, validate_input};
use crate::hashes::{leaf_hash, node_hash};
use crate::leaf::ToLeafBytes;
use crate::options::MerkleTreeOptions;
use crate::proof::{MerkleProof, ProofStep, Side, verify};
use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

pub const TREE_DATA_FORMAT: &str = "airdrop-v1";

/// Root reported for an empty leaf set. It is a sentinel only and must never
/// be published as a campaign commitment.
pub const ZERO_ROOT: Bytes32 = [0u8; 32];

fn hash_pair(pair: &[Bytes32], options: &MerkleTreeOptions) -> Bytes32 {
    let left = &pair[0];
    // An unpaired last node is hashed with itself.
    let right = pair.get(1).unwrap_or(left);
    node_hash(left, right, options)
}

fn next_level(level: &[Bytes32], options: &MerkleTreeOptions) -> Vec<Bytes32> {
    if level.len() >= options.parallel_threshold {
        level
            .par_chunks(2)
            .map(|pair| hash_pair(pair, options))
            .collect()
    } else {
        level
            .chunks(2)
            .map(|pair| hash_pair(pair, options))
            .collect()
    }
}

fn hash_leaves<T: ToLeafBytes + Sync>(records: &[T], options: &MerkleTreeOptions) -> Vec<Bytes32> {
    if records.len() >= options.parallel_threshold {
        records
            .par_iter()
            .map(|record| leaf_hash(&record.to_leaf_bytes(), options))
            .collect()
    } else {
        records
            .iter()
            .map(|record| leaf_hash(&record.to_leaf_bytes(), options))
            .collect()
    }
}

fn build_levels(leaves: Vec<Bytes32>, options: &MerkleTreeOptions) -> Vec<Vec<Bytes32>> {
    let mut levels = vec![leaves];
    while let Some(level) = levels.last().filter(|level| level.len() > 1) {
        let parent = next_level(level, options);
        trace!("built level {} with {} nodes", levels.len(), parent.len());
        levels.push(parent);
    }
    levels
}

/// Computes only the root of `leaves`, without keeping the inner levels.
///
/// Returns [`ZERO_ROOT`] for an empty slice.
#[must_use]
pub fn compute_root(leaves: &[Bytes32], options: &MerkleTreeOptions) -> Bytes32 {
    let Some(first) = leaves.first() else {
        return ZERO_ROOT;
    };
    if leaves.len() == 1 {
        return *first;
    }
    let mut level = next_level(leaves, options);
    while level.len() > 1 {
        level = next_level(&level, options);
    }
    level[0]
}

/// Serializable snapshot of a built tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleTreeData {
    pub format: String,
    pub options: MerkleTreeOptions,
    #[serde(with = "hex32")]
    pub root: Bytes32,
    #[serde(with = "hex32_vec")]
    pub leaves: Vec<Bytes32>,
}

impl MerkleTreeData {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Binary hash tree over an ordered leaf set.
///
/// `levels[0]` holds the leaf hashes in input order and the last level holds
/// the root alone. A level with an odd number of nodes pairs its last node
/// with itself. The tree is immutable once built.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Bytes32>>,
    options: MerkleTreeOptions,
    leaf_lookup: HashMap<Bytes32, usize>,
}

impl MerkleTree {
    /// Hashes every record into a leaf and builds the tree over them, keeping
    /// input order.
    pub fn build<T: ToLeafBytes + Sync>(records: &[T], options: MerkleTreeOptions) -> Result<Self> {
        validate_input(!records.is_empty(), "Expected non-zero number of leaves")?;
        let leaves = hash_leaves(records, &options);
        Self::from_leaf_hashes(leaves, options)
    }

    /// Builds the tree over leaves that are already hashed.
    pub fn from_leaf_hashes(leaves: Vec<Bytes32>, options: MerkleTreeOptions) -> Result<Self> {
        validate_input(!leaves.is_empty(), "Expected non-zero number of leaves")?;

        let mut leaf_lookup = HashMap::with_capacity(leaves.len());
        let mut duplicates = 0usize;
        for (index, leaf) in leaves.iter().enumerate() {
            match leaf_lookup.entry(*leaf) {
                Entry::Vacant(entry) => {
                    entry.insert(index);
                }
                Entry::Occupied(_) => duplicates += 1,
            }
        }
        if duplicates > 0 {
            warn!("{duplicates} duplicate leaves, lookups resolve to the first occurrence");
        }

        let leaf_count = leaves.len();
        let levels = build_levels(leaves, &options);
        let tree = Self {
            levels,
            options,
            leaf_lookup,
        };
        debug!(
            "built merkle tree: leaves={} height={} hash={} root={}",
            leaf_count,
            tree.height(),
            options.hash,
            tree.root_hex()
        );
        Ok(tree)
    }

    pub fn root(&self) -> &Bytes32 {
        // build_levels always ends with a single-node level
        &self.levels[self.levels.len() - 1][0]
    }

    pub fn root_hex(&self) -> HexString {
        bytes32_to_hex(self.root())
    }

    pub fn options(&self) -> &MerkleTreeOptions {
        &self.options
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels above the leaves, `ceil(log2(leaf_count))`.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaf(&self, index: usize) -> Option<&Bytes32> {
        self.levels[0].get(index)
    }

    pub fn leaves(&self) -> &[Bytes32] {
        &self.levels[0]
    }

    pub fn levels(&self) -> &[Vec<Bytes32>] {
        &self.levels
    }

    /// Hash a record would have as a leaf of this tree.
    pub fn leaf_hash<T: ToLeafBytes + ?Sized>(&self, record: &T) -> Bytes32 {
        leaf_hash(&record.to_leaf_bytes(), &self.options)
    }

    pub fn leaf_lookup<T: ToLeafBytes + ?Sized>(&self, record: &T) -> Result<usize> {
        self.leaf_index_of(&self.leaf_hash(record))
    }

    pub fn leaf_index_of(&self, leaf_hash: &Bytes32) -> Result<usize> {
        self.leaf_lookup
            .get(leaf_hash)
            .copied()
            .ok_or(MerkleTreeError::LeafNotInTree)
    }

    /// Builds the inclusion proof for the leaf at `leaf_index`.
    pub fn proof(&self, leaf_index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if leaf_index >= leaf_count {
            return Err(MerkleTreeError::IndexOutOfRange {
                index: leaf_index,
                leaf_count,
            });
        }

        let mut steps = Vec::with_capacity(self.height());
        let mut index = leaf_index;
        for level in &self.levels[..self.height()] {
            let hash = match level.get(index ^ 1) {
                Some(sibling) => *sibling,
                None => level[index],
            };
            steps.push(ProofStep {
                hash,
                side: Side::of_sibling(index),
            });
            index /= 2;
        }

        Ok(MerkleProof { leaf_index, steps })
    }

    /// Sibling hashes of the proof for `leaf_index`, leaf level first.
    pub fn proof_hashes(&self, leaf_index: usize) -> Result<Vec<Bytes32>> {
        Ok(self.proof(leaf_index)?.hashes())
    }

    pub fn proof_for<T: ToLeafBytes + ?Sized>(&self, record: &T) -> Result<MerkleProof> {
        self.proof(self.leaf_lookup(record)?)
    }

    /// Verifies `proof` for `record` against this tree's root.
    pub fn verify_proof<T: ToLeafBytes + ?Sized>(&self, record: &T, proof: &MerkleProof) -> bool {
        self.verify_leaf_hash(&self.leaf_hash(record), proof)
    }

    pub fn verify_leaf_hash(&self, leaf_hash: &Bytes32, proof: &MerkleProof) -> bool {
        verify(leaf_hash, proof, self.root(), &self.options)
    }

    pub fn dump(&self) -> MerkleTreeData {
        MerkleTreeData {
            format: TREE_DATA_FORMAT.to_string(),
            options: self.options,
            root: *self.root(),
            leaves: self.levels[0].clone(),
        }
    }

    /// Rebuilds a tree from a snapshot and checks it against the stored root.
    pub fn load(data: MerkleTreeData) -> Result<Self> {
        if data.format != TREE_DATA_FORMAT {
            return Err(MerkleTreeError::UnknownFormat(data.format));
        }
        let tree = Self::from_leaf_hashes(data.leaves, data.options)?;
        invariant(
            tree.root() == &data.root,
            "Stored root does not match the rebuilt tree",
        )?;
        debug!("loaded merkle tree with {} leaves", tree.leaf_count());
        Ok(tree)
    }

    /// Renders the tree top-down, one node per line as `level:index) hash`.
    pub fn render(&self) -> String {
        let top = self.height();
        let mut stack: Vec<(usize, usize, bool, Vec<bool>)> = vec![(top, 0, false, vec![])];
        let mut lines = Vec::new();

        while let Some((level, index, duplicate, path)) = stack.pop() {
            let mut line = String::new();
            for &more in path.iter().take(path.len().saturating_sub(1)) {
                line.push_str(if more { "│  " } else { "   " });
            }
            if let Some(&more) = path.last() {
                line.push_str(if more { "├─ " } else { "└─ " });
            }
            line.push_str(&format!(
                "{level}:{index}) {}",
                bytes32_to_hex(&self.levels[level][index])
            ));
            if duplicate {
                line.push_str(" (dup)");
            }
            lines.push(line);

            if level == 0 || duplicate {
                continue;
            }
            let below = &self.levels[level - 1];
            let left = 2 * index;
            let right = left + 1;
            let child = |more: bool| [path.clone(), vec![more]].concat();
            if right < below.len() {
                stack.push((level - 1, right, false, child(false)));
            } else {
                stack.push((level - 1, left, true, child(false)));
            }
            stack.push((level - 1, left, false, child(true)));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::concat;
    use crate::hashes::{HashAlgorithm, sha256};
    use crate::leaf::Allocation;
    use crate::proof::verify_hashes;

    fn records(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("recipient-{i}:{}", i * 10)).collect()
    }

    fn build(count: usize) -> MerkleTree {
        MerkleTree::build(&records(count), MerkleTreeOptions::default()).unwrap()
    }

    fn h(a: &Bytes32, b: &Bytes32) -> Bytes32 {
        sha256(&concat(a, b))
    }

    #[test]
    fn test_empty_input_rejected() {
        let empty: Vec<String> = vec![];
        let result = MerkleTree::build(&empty, MerkleTreeOptions::default());
        assert!(matches!(result, Err(MerkleTreeError::InvalidInput(_))));
        let result = MerkleTree::from_leaf_hashes(vec![], MerkleTreeOptions::default());
        assert!(matches!(result, Err(MerkleTreeError::InvalidInput(_))));
    }

    #[test]
    fn test_compute_root_empty_is_sentinel() {
        assert_eq!(compute_root(&[], &MerkleTreeOptions::default()), ZERO_ROOT);
    }

    #[test]
    fn test_compute_root_matches_tree() {
        for count in 1..=17 {
            let tree = build(count);
            assert_eq!(
                compute_root(tree.leaves(), tree.options()),
                *tree.root(),
                "count {count}"
            );
        }
    }

    #[test]
    fn test_single_leaf() {
        let tree = MerkleTree::build(&["only:1"], MerkleTreeOptions::default()).unwrap();
        assert_eq!(*tree.root(), sha256(b"only:1"));
        assert_eq!(tree.height(), 0);

        let proof = tree.proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(verify(&sha256(b"only:1"), &proof, tree.root(), tree.options()));
    }

    #[test]
    fn test_height_is_ceil_log2() {
        for count in 1..=33usize {
            let tree = build(count);
            let expected = count.next_power_of_two().trailing_zeros() as usize;
            assert_eq!(tree.height(), expected, "count {count}");
            for i in 0..count {
                assert_eq!(tree.proof(i).unwrap().len(), expected);
            }
        }
    }

    #[test]
    fn test_three_leaves_duplicate_last() {
        let tree = MerkleTree::build(&["A", "B", "C"], MerkleTreeOptions::default()).unwrap();
        let (a, b, c) = (sha256(b"A"), sha256(b"B"), sha256(b"C"));
        let ab = h(&a, &b);
        let cc = h(&c, &c);
        assert_eq!(tree.levels()[1], vec![ab, cc]);
        assert_eq!(*tree.root(), h(&ab, &cc));

        let proof = tree.proof(2).unwrap();
        assert_eq!(
            proof.steps,
            vec![
                ProofStep {
                    hash: c,
                    side: Side::Right
                },
                ProofStep {
                    hash: ab,
                    side: Side::Left
                },
            ]
        );
        assert!(tree.verify_proof("C", &proof));
    }

    #[test]
    fn test_airdrop_scenario() {
        let inputs = ["alice:100", "bob:200", "carol:150"];
        let tree = MerkleTree::build(&inputs, MerkleTreeOptions::default()).unwrap();
        let alice = sha256(b"alice:100");
        let bob = sha256(b"bob:200");
        let carol = sha256(b"carol:150");
        let root = h(&h(&alice, &bob), &h(&carol, &carol));
        assert_eq!(*tree.root(), root);

        let proof = tree.proof(1).unwrap();
        assert_eq!(proof.hashes(), vec![alice, h(&carol, &carol)]);
        assert!(verify(&bob, &proof, &root, tree.options()));

        let other_root = sha256(b"some other campaign");
        assert!(!verify(&bob, &proof, &other_root, tree.options()));
    }

    #[test]
    fn test_round_trip_every_index() {
        for count in [2, 5, 8, 13, 64, 100] {
            let inputs = records(count);
            let tree = MerkleTree::build(&inputs, MerkleTreeOptions::default()).unwrap();
            for (i, input) in inputs.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(verify(&sha256(input.as_bytes()), &proof, tree.root(), tree.options()));
                assert!(verify_hashes(
                    &sha256(input.as_bytes()),
                    &tree.proof_hashes(i).unwrap(),
                    i,
                    tree.root(),
                    tree.options()
                ));
            }
        }
    }

    #[test]
    fn test_tamper_any_bit() {
        let inputs = records(5);
        let tree = MerkleTree::build(&inputs, MerkleTreeOptions::default()).unwrap();
        for (i, input) in inputs.iter().enumerate() {
            let leaf = tree.leaf_hash(input);
            let proof = tree.proof(i).unwrap();
            for step in 0..proof.len() {
                for bit in 0..256 {
                    let mut tampered = proof.clone();
                    tampered.steps[step].hash[bit / 8] ^= 1 << (bit % 8);
                    assert!(!tree.verify_leaf_hash(&leaf, &tampered));
                }
            }
            let other = tree.leaf_hash(&inputs[(i + 1) % inputs.len()]);
            assert!(!tree.verify_leaf_hash(&other, &proof));
        }
    }

    #[test]
    fn test_order_sensitive() {
        let forward =
            MerkleTree::build(&["x:1", "y:2", "z:3"], MerkleTreeOptions::default()).unwrap();
        let permuted =
            MerkleTree::build(&["y:2", "x:1", "z:3"], MerkleTreeOptions::default()).unwrap();
        assert_ne!(forward.root(), permuted.root());
    }

    #[test]
    fn test_deterministic() {
        let first = build(11);
        let second = build(11);
        assert_eq!(first.root(), second.root());
        for i in 0..11 {
            assert_eq!(first.proof(i).unwrap(), second.proof(i).unwrap());
        }
    }

    #[test]
    fn test_out_of_range() {
        let tree = build(4);
        assert_eq!(
            tree.proof(4),
            Err(MerkleTreeError::IndexOutOfRange {
                index: 4,
                leaf_count: 4
            })
        );
        assert!(tree.proof(3).is_ok());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let inputs = records(1000);
        let sequential = MerkleTree::build(
            &inputs,
            MerkleTreeOptions::default().with_parallel_threshold(usize::MAX),
        )
        .unwrap();
        let parallel = MerkleTree::build(
            &inputs,
            MerkleTreeOptions::default().with_parallel_threshold(2),
        )
        .unwrap();
        assert_eq!(sequential.levels(), parallel.levels());
    }

    #[test]
    fn test_lookup_and_proof_for() {
        let inputs = records(6);
        let tree = MerkleTree::build(&inputs, MerkleTreeOptions::default()).unwrap();
        assert_eq!(tree.leaf_lookup(&inputs[4]).unwrap(), 4);
        let proof = tree.proof_for(&inputs[4]).unwrap();
        assert_eq!(proof.leaf_index, 4);
        assert!(tree.verify_proof(&inputs[4], &proof));
        assert_eq!(
            tree.proof_for("stranger:0"),
            Err(MerkleTreeError::LeafNotInTree)
        );
    }

    #[test]
    fn test_duplicate_leaves_resolve_to_first() {
        let tree =
            MerkleTree::build(&["dup", "other", "dup"], MerkleTreeOptions::default()).unwrap();
        assert_eq!(tree.leaf_lookup("dup").unwrap(), 0);
        assert!(tree.verify_proof("dup", &tree.proof(2).unwrap()));
    }

    #[test]
    fn test_variants_round_trip() {
        let inputs = records(7);
        let variants = [
            MerkleTreeOptions::default().with_domain_separation(true),
            MerkleTreeOptions::default().with_hash(HashAlgorithm::Keccak256),
            MerkleTreeOptions::evm_sorted(),
        ];
        let plain = build(7);
        for options in variants {
            let tree = MerkleTree::build(&inputs, options).unwrap();
            assert_ne!(tree.root(), plain.root());
            for (i, input) in inputs.iter().enumerate() {
                assert!(tree.verify_proof(input, &tree.proof(i).unwrap()));
            }
        }
    }

    #[test]
    fn test_sorted_pairs_ignore_sides() {
        let inputs = records(4);
        let tree = MerkleTree::build(&inputs, MerkleTreeOptions::evm_sorted()).unwrap();
        let mut proof = tree.proof(1).unwrap();
        for step in &mut proof.steps {
            step.side = Side::Right;
        }
        assert!(tree.verify_proof(&inputs[1], &proof));
    }

    #[test]
    fn test_allocation_tree() {
        let allocations: Vec<Allocation> = [
            "0x1111111111111111111111111111111111111111,1000",
            "0x2222222222222222222222222222222222222222,2500",
            "0x3333333333333333333333333333333333333333,500",
        ]
        .iter()
        .map(|line| line.parse().unwrap())
        .collect();
        let tree = MerkleTree::build(&allocations, MerkleTreeOptions::evm_sorted()).unwrap();
        let leaf = crate::hashes::keccak256(&allocations[2].encode());
        assert_eq!(tree.leaf(2), Some(&leaf));
        assert!(tree.verify_proof(&allocations[2], &tree.proof(2).unwrap()));
    }

    #[test]
    fn test_dump_and_load() {
        let tree = build(9);
        let json = tree.dump().to_json().unwrap();
        let loaded = MerkleTree::load(MerkleTreeData::from_json(&json).unwrap()).unwrap();
        assert_eq!(loaded.root(), tree.root());
        assert_eq!(loaded.levels(), tree.levels());
        assert_eq!(loaded.render(), tree.render());
    }

    #[test]
    fn test_load_rejects_bad_data() {
        let mut data = build(3).dump();
        data.format = "simple-v1".to_string();
        assert!(matches!(
            MerkleTree::load(data),
            Err(MerkleTreeError::UnknownFormat(_))
        ));

        let mut data = build(3).dump();
        data.root[0] ^= 1;
        assert!(matches!(
            MerkleTree::load(data),
            Err(MerkleTreeError::Invariant(_))
        ));

        let mut data = build(3).dump();
        data.leaves.clear();
        assert!(matches!(
            MerkleTree::load(data),
            Err(MerkleTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_render() {
        let tree = MerkleTree::build(&["A", "B", "C"], MerkleTreeOptions::default()).unwrap();
        let rendered = tree.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("2:0) 0x"));
        assert!(lines[1].starts_with("├─ 1:0)"));
        assert!(lines.iter().any(|l| l.contains("0:2)") && l.ends_with("(dup)")));
    }

    #[test]
    fn test_tree_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MerkleTree>();
    }
}

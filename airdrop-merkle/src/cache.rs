use crate::bytes::Bytes32;
use crate::error::Result;
use crate::proof::MerkleProof;
use crate::tree::MerkleTree;
use dashmap::DashMap;
use log::debug;
use std::hash::Hash;
use std::sync::Arc;

/// Built trees keyed by campaign.
///
/// Owned by the caller; nothing in this crate keeps trees in global state.
/// Trees are immutable, so lookups hand out shared handles that stay valid
/// after the entry is replaced or removed.
#[derive(Debug)]
pub struct TreeCache<K: Eq + Hash> {
    trees: DashMap<K, Arc<MerkleTree>>,
}

impl<K: Eq + Hash> Default for TreeCache<K> {
    fn default() -> Self {
        Self {
            trees: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> TreeCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `tree` for `campaign`, returning the tree it replaced.
    pub fn insert(&self, campaign: K, tree: MerkleTree) -> Option<Arc<MerkleTree>> {
        self.trees.insert(campaign, Arc::new(tree))
    }

    pub fn get(&self, campaign: &K) -> Option<Arc<MerkleTree>> {
        self.trees.get(campaign).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the cached tree, building it with `build` on a miss. A failed
    /// build leaves the cache untouched.
    pub fn get_or_build<F>(&self, campaign: K, build: F) -> Result<Arc<MerkleTree>>
    where
        F: FnOnce() -> Result<MerkleTree>,
    {
        if let Some(tree) = self.get(&campaign) {
            return Ok(tree);
        }
        let tree = Arc::new(build()?);
        debug!("cached tree with root {}", tree.root_hex());
        // Another caller may have raced us here; keep whichever landed first.
        Ok(Arc::clone(self.trees.entry(campaign).or_insert(tree).value()))
    }

    pub fn root(&self, campaign: &K) -> Option<Bytes32> {
        self.trees.get(campaign).map(|entry| *entry.root())
    }

    /// Proof for `leaf_index` in the campaign's tree, or `None` when the
    /// campaign is not cached.
    pub fn proof(&self, campaign: &K, leaf_index: usize) -> Option<Result<MerkleProof>> {
        self.trees.get(campaign).map(|entry| entry.proof(leaf_index))
    }

    pub fn remove(&self, campaign: &K) -> Option<Arc<MerkleTree>> {
        self.trees.remove(campaign).map(|(_, tree)| tree)
    }

    pub fn contains(&self, campaign: &K) -> bool {
        self.trees.contains_key(campaign)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn clear(&self) {
        self.trees.clear();
    }
}

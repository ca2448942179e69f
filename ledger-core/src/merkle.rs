//! Merkleized key-value tree
//!
//! The account store and the tally live in this tree; its root hash is the
//! application hash handed back to the consensus host on commit.
//!
//! # Design
//!
//! - Leaves are `(key, value)` pairs kept sorted by raw key bytes
//! - Leaf hash: SHA-256(0x00 || len(key) as u32 BE || key || value)
//! - Internal hash: SHA-256(0x01 || left || right), last node duplicated on odd levels
//! - `save` writes a snapshot under `node:` || root into the tree store;
//!   `load(root)` restores it and checks the recomputed root
//! - `copy` is a structural copy sharing the store handle

use crate::{storage::StoreHandle, Error, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Root hash of a tree with no leaves
pub const EMPTY_ROOT: [u8; 32] = [0u8; 32];

const NODE_PREFIX: &[u8] = b"node:";
const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;

/// Hash a leaf
fn leaf_hash(key: &[u8], value: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    hasher.update((key.len() as u32).to_be_bytes());
    hasher.update(key);
    hasher.update(value);
    hasher.finalize().into()
}

/// Hash a pair of hashes (used for internal nodes)
fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_TAG]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Compute root from ordered leaf hashes
fn compute_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return EMPTY_ROOT;
    }

    let mut current_level = leaves.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));

        for i in (0..current_level.len()).step_by(2) {
            let left = current_level[i];
            let right = if i + 1 < current_level.len() {
                current_level[i + 1]
            } else {
                // Duplicate last hash if odd
                current_level[i]
            };

            next_level.push(hash_pair(&left, &right));
        }

        current_level = next_level;
    }

    current_level[0]
}

fn node_key(root: &[u8; 32]) -> Vec<u8> {
    let mut key = NODE_PREFIX.to_vec();
    key.extend_from_slice(root);
    key
}

/// Merkleized key-value tree backed by a snapshot store
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Leaves ordered by key
    leaves: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Snapshot store
    store: StoreHandle,
    /// Cached root hash
    cached_root: Option<[u8; 32]>,
}

impl MerkleTree {
    /// Create empty tree
    pub fn new(store: StoreHandle) -> Self {
        Self {
            leaves: BTreeMap::new(),
            store,
            cached_root: Some(EMPTY_ROOT),
        }
    }

    /// Get the value under a key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.leaves.get(key).map(Vec::as_slice)
    }

    /// Whether a key is present
    pub fn has(&self, key: &[u8]) -> bool {
        self.leaves.contains_key(key)
    }

    /// Insert or overwrite; returns true if the key already existed
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> bool {
        self.cached_root = None;
        self.leaves.insert(key.to_vec(), value.to_vec()).is_some()
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let removed = self.leaves.remove(key);
        if removed.is_some() {
            self.cached_root = None;
        }
        removed
    }

    /// Get number of leaves
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Ordered iterator over all leaves
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.leaves.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Visit leaves in key order until the visitor returns true.
    /// Returns whether the visit was stopped early.
    pub fn iterate<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        for (key, value) in &self.leaves {
            if visitor(key, value) {
                return true;
            }
        }
        false
    }

    /// Structural copy sharing the snapshot store
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Compute Merkle root
    pub fn root_hash(&mut self) -> [u8; 32] {
        if let Some(root) = self.cached_root {
            return root;
        }

        let hashes: Vec<[u8; 32]> = self
            .leaves
            .iter()
            .map(|(k, v)| leaf_hash(k, v))
            .collect();
        let root = compute_root(&hashes);
        self.cached_root = Some(root);
        root
    }

    /// Persist a snapshot and return its root hash
    pub fn save(&mut self) -> Result<[u8; 32]> {
        let root = self.root_hash();
        if root == EMPTY_ROOT {
            return Ok(root);
        }

        let snapshot = bincode::serialize(&self.leaves)?;
        self.store.set(&node_key(&root), &snapshot)?;

        tracing::debug!(
            root = %hex::encode_upper(root),
            leaves = self.leaves.len(),
            "Merkle snapshot saved"
        );

        Ok(root)
    }

    /// Replace the contents with the snapshot saved under `root`
    pub fn load(&mut self, root: [u8; 32]) -> Result<()> {
        if root == EMPTY_ROOT {
            self.leaves.clear();
            self.cached_root = Some(EMPTY_ROOT);
            return Ok(());
        }

        let snapshot = self.store.get(&node_key(&root))?.ok_or_else(|| {
            Error::NotFound(format!("Merkle snapshot {}", hex::encode_upper(root)))
        })?;
        let leaves: BTreeMap<Vec<u8>, Vec<u8>> = bincode::deserialize(&snapshot)?;

        self.leaves = leaves;
        self.cached_root = None;

        let computed = self.root_hash();
        if computed != root {
            return Err(Error::InvalidState(format!(
                "Merkle snapshot hash mismatch: expected {}, computed {}",
                hex::encode_upper(root),
                hex::encode_upper(computed)
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;

    fn tree() -> MerkleTree {
        MerkleTree::new(MemStore::handle())
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = tree();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.root_hash(), EMPTY_ROOT);
        assert_eq!(tree.save().unwrap(), EMPTY_ROOT);
    }

    #[test]
    fn test_single_leaf() {
        let mut tree = tree();
        tree.set(b"k1", b"v1");

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_hash(), leaf_hash(b"k1", b"v1"));
    }

    #[test]
    fn test_odd_number_leaves() {
        let mut tree = tree();
        tree.set(b"a", b"1");
        tree.set(b"b", b"2");
        tree.set(b"c", b"3");

        // With odd number, last leaf is duplicated
        let h01 = hash_pair(&leaf_hash(b"a", b"1"), &leaf_hash(b"b", b"2"));
        let h22 = hash_pair(&leaf_hash(b"c", b"3"), &leaf_hash(b"c", b"3"));
        assert_eq!(tree.root_hash(), hash_pair(&h01, &h22));
    }

    #[test]
    fn test_root_independent_of_insert_order() {
        let mut t1 = tree();
        let mut t2 = tree();

        for i in 0u8..10 {
            t1.set(&[i], &[i * 2]);
        }
        for i in (0u8..10).rev() {
            t2.set(&[i], &[i * 2]);
        }

        assert_eq!(t1.root_hash(), t2.root_hash());
    }

    #[test]
    fn test_set_remove_invalidate_root() {
        let mut tree = tree();
        tree.set(b"a", b"1");
        let root1 = tree.root_hash();

        assert!(tree.set(b"a", b"2"));
        let root2 = tree.root_hash();
        assert_ne!(root1, root2);

        assert_eq!(tree.remove(b"a"), Some(b"2".to_vec()));
        assert_eq!(tree.remove(b"a"), None);
        assert_eq!(tree.root_hash(), EMPTY_ROOT);
    }

    #[test]
    fn test_iterate_stops() {
        let mut tree = tree();
        for key in [b"c", b"a", b"b"] {
            tree.set(key, b"x");
        }

        let mut seen = Vec::new();
        let stopped = tree.iterate(|k, _| {
            seen.push(k.to_vec());
            k == b"b"
        });
        assert!(stopped);
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec()]);

        assert!(!tree.iterate(|_, _| false));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = tree();
        original.set(b"a", b"1");

        let mut copy = original.copy();
        copy.set(b"b", b"2");

        assert!(!original.has(b"b"));
        assert_ne!(original.root_hash(), copy.root_hash());
    }

    #[test]
    fn test_save_and_load() {
        let store = MemStore::handle();
        let mut tree = MerkleTree::new(store.clone());
        tree.set(b"a", b"1");
        tree.set(b"b", b"2");
        let root = tree.save().unwrap();

        // Later mutations do not affect the saved snapshot
        tree.set(b"c", b"3");

        let mut restored = MerkleTree::new(store);
        restored.load(root).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(b"b"), Some(&b"2"[..]));
        assert_eq!(restored.root_hash(), root);
    }

    #[test]
    fn test_load_unknown_root() {
        let mut tree = tree();
        let err = tree.load([9u8; 32]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_load_detects_tampered_snapshot() {
        let store = MemStore::handle();
        let mut tree = MerkleTree::new(store.clone());
        tree.set(b"a", b"1");
        let root = tree.save().unwrap();

        let mut forged = BTreeMap::new();
        forged.insert(b"a".to_vec(), b"2".to_vec());
        store
            .set(&node_key(&root), &bincode::serialize(&forged).unwrap())
            .unwrap();

        let err = MerkleTree::new(store).load(root).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}

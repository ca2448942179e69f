//! Account store
//!
//! Accounts live in the merkle tree under their 32-byte public key. Writes go
//! to a staging cache and reach the tree only on [`AccountStore::sync`], which
//! flushes in key order so the resulting root does not depend on the order
//! accounts were touched.

use crate::{
    merkle::MerkleTree,
    storage::StoreHandle,
    types::{Account, PublicKey},
    Error, Result,
};
use std::collections::BTreeMap;

/// Merkleized account records with a write-back cache
#[derive(Debug, Clone)]
pub struct AccountStore {
    cache: BTreeMap<PublicKey, Account>,
    tree: MerkleTree,
    synced: bool,
}

impl AccountStore {
    /// Empty store over a fresh tree
    pub fn new(tree_store: StoreHandle) -> Self {
        Self::with_tree(MerkleTree::new(tree_store))
    }

    fn with_tree(tree: MerkleTree) -> Self {
        Self {
            cache: BTreeMap::new(),
            tree,
            synced: true,
        }
    }

    /// Look up an account, cache first
    pub fn get_account(&self, pubkey: &PublicKey) -> Result<Account> {
        if let Some(account) = self.cache.get(pubkey) {
            return Ok(account.clone());
        }

        match self.tree.get(&pubkey.account_key()) {
            Some(bytes) => Account::from_bytes(bytes),
            None => Err(Error::NotFound(format!("Account {}", pubkey))),
        }
    }

    /// Stage an account write
    pub fn set_account(&mut self, pubkey: PublicKey, account: Account) {
        self.cache.insert(pubkey, account);
        self.synced = false;
    }

    /// Flush the cache into the tree in key order. The cache is kept.
    pub fn sync(&mut self) -> Result<()> {
        for (pubkey, account) in &self.cache {
            self.tree.set(&pubkey.account_key(), &account.to_bytes()?);
        }
        self.synced = true;
        Ok(())
    }

    /// Sync and persist the tree, returning its root hash
    pub fn save(&mut self) -> Result<[u8; 32]> {
        self.sync()?;
        self.tree.save()
    }

    /// Copy of the tree with an empty cache. Every staged write must be synced.
    pub fn copy(&self) -> Result<Self> {
        if !self.synced {
            return Err(Error::InvalidState(format!(
                "Cannot copy account store with {} unsynced entries",
                self.cache.len()
            )));
        }
        Ok(Self::with_tree(self.tree.copy()))
    }

    /// Replace the tree with the snapshot at `root` and drop the cache
    pub fn load(&mut self, root: [u8; 32]) -> Result<()> {
        self.tree.load(root)?;
        self.cache.clear();
        self.synced = true;
        Ok(())
    }

    pub(crate) fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut MerkleTree {
        &mut self.tree
    }
}

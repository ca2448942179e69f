//! Nonce registry (replay protection)
//!
//! A `{pubkey, nonce}` pair may be consumed once. Consumed pairs are staged in
//! memory until they are written to the raw store, either alone through
//! [`NonceRegistry::save`] or as part of a larger commit batch.

use crate::{
    storage::{StoreBatch, StoreHandle},
    types::{Nonce, PublicKey},
    Error, Result,
};
use std::collections::BTreeSet;

/// Marker value stored under a consumed nonce key
const CONSUMED: &[u8] = &[1];

/// Store key for a nonce: raw pubkey bytes followed by raw nonce bytes
pub fn nonce_key(pubkey: &PublicKey, nonce: &Nonce) -> Vec<u8> {
    let mut key = Vec::with_capacity(pubkey.as_bytes().len() + nonce.len());
    key.extend_from_slice(pubkey.as_bytes());
    key.extend_from_slice(nonce.as_bytes());
    key
}

/// Set of consumed nonces with a staging layer
#[derive(Debug, Clone)]
pub struct NonceRegistry {
    staged: BTreeSet<Vec<u8>>,
    store: StoreHandle,
}

impl NonceRegistry {
    /// Registry over `store` with nothing staged
    pub fn new(store: StoreHandle) -> Self {
        Self {
            staged: BTreeSet::new(),
            store,
        }
    }

    /// Consume a nonce. Returns false if it was already used.
    pub fn add_nonce(&mut self, pubkey: &PublicKey, nonce: &Nonce) -> Result<bool> {
        let key = nonce_key(pubkey, nonce);

        if self.staged.contains(&key) {
            return Ok(false);
        }
        if self.store.get(&key)?.is_some() {
            return Ok(false);
        }

        self.staged.insert(key);
        Ok(true)
    }

    /// Number of nonces consumed since the last save
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Queue staged nonces into `batch`. Staging is kept.
    pub fn write_to(&self, batch: &mut StoreBatch) {
        for key in &self.staged {
            batch.put(key, CONSUMED);
        }
    }

    /// Drop staging once a batch from [`NonceRegistry::write_to`] is durable
    pub fn mark_saved(&mut self) {
        tracing::debug!(count = self.staged.len(), "Nonces flushed");
        self.staged.clear();
    }

    /// Write staged nonces to the store and clear staging
    pub fn save(&mut self) -> Result<()> {
        let mut batch = StoreBatch::new();
        self.write_to(&mut batch);
        self.store.write_batch(batch)?;
        self.mark_saved();
        Ok(())
    }

    /// Fresh registry over the same store. Staging must be empty.
    pub fn copy(&self) -> Result<Self> {
        if !self.staged.is_empty() {
            return Err(Error::InvalidState(format!(
                "Cannot copy nonce registry with {} unsaved nonces",
                self.staged.len()
            )));
        }
        Ok(Self::new(self.store.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;

    fn pk(b: u8) -> PublicKey {
        PublicKey::from_bytes([b; 32])
    }

    #[test]
    fn test_add_nonce_once() {
        let mut registry = NonceRegistry::new(MemStore::handle());
        let nonce = Nonce::new(vec![0]);

        assert!(registry.add_nonce(&pk(1), &nonce).unwrap());
        assert!(!registry.add_nonce(&pk(1), &nonce).unwrap());
        // Same nonce, different signer
        assert!(registry.add_nonce(&pk(2), &nonce).unwrap());
        assert_eq!(registry.staged_len(), 2);
    }

    #[test]
    fn test_saved_nonce_stays_consumed() {
        let store = MemStore::handle();
        let mut registry = NonceRegistry::new(store.clone());
        let nonce = Nonce::new(b"abc".to_vec());

        assert!(registry.add_nonce(&pk(1), &nonce).unwrap());
        registry.save().unwrap();
        assert_eq!(registry.staged_len(), 0);
        assert_eq!(
            store.get(&nonce_key(&pk(1), &nonce)).unwrap(),
            Some(vec![1])
        );

        let mut copy = registry.copy().unwrap();
        assert!(!copy.add_nonce(&pk(1), &nonce).unwrap());
        assert!(!registry.add_nonce(&pk(1), &nonce).unwrap());
    }

    #[test]
    fn test_write_to_keeps_staging() {
        let store = MemStore::handle();
        let mut registry = NonceRegistry::new(store.clone());
        let nonce = Nonce::new(vec![4]);
        registry.add_nonce(&pk(1), &nonce).unwrap();

        let mut batch = StoreBatch::new();
        registry.write_to(&mut batch);
        assert_eq!(batch.len(), 1);
        assert_eq!(registry.staged_len(), 1);
        assert_eq!(store.get(&nonce_key(&pk(1), &nonce)).unwrap(), None);

        store.write_batch(batch).unwrap();
        registry.mark_saved();
        assert_eq!(registry.staged_len(), 0);
        assert!(!registry.add_nonce(&pk(1), &nonce).unwrap());
    }

    #[test]
    fn test_copies_stage_separately() {
        let mut registry = NonceRegistry::new(MemStore::handle());
        let mut a = registry.copy().unwrap();
        let mut b = registry.copy().unwrap();
        let nonce = Nonce::new(vec![7]);

        assert!(a.add_nonce(&pk(1), &nonce).unwrap());
        assert!(b.add_nonce(&pk(1), &nonce).unwrap());
        assert!(registry.add_nonce(&pk(1), &nonce).unwrap());
    }

    #[test]
    fn test_copy_with_staged_nonces_fails() {
        let mut registry = NonceRegistry::new(MemStore::handle());
        registry.add_nonce(&pk(1), &Nonce::new(vec![0])).unwrap();
        assert!(matches!(registry.copy(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_nonce_key_layout() {
        let key = nonce_key(&pk(9), &Nonce::new(vec![1, 2]));
        assert_eq!(key.len(), 34);
        assert_eq!(&key[..32], &[9u8; 32]);
        assert_eq!(&key[32..], &[1, 2]);
    }
}

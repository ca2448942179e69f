//! Ledger state
//!
//! One tally, one account store and one nonce registry over shared store
//! handles. The application keeps three of these (committed, block, mempool);
//! block and mempool are copies of committed taken at block boundaries.
//!
//! # Persisted layout
//!
//! - raw store `STATE` -> root hash of the last saved tree
//! - raw store `TALLYKEY` -> tally encoding (mirror of the tree entry)
//! - raw store `pubkey || nonce` -> `[1]` for every consumed nonce
//! - tree `TALLYKEY` -> tally encoding
//! - tree `pubkey` -> account encoding
//!
//! A save writes the tree snapshot first, then every raw-store key in one
//! batch. A snapshot is keyed by its own root, so one left behind by a failed
//! save is never referenced and the previous root stays authoritative.

use crate::{
    accounts::AccountStore,
    nonces::NonceRegistry,
    storage::{StoreBatch, StoreHandle},
    tally::{Tally, TALLY_KEY},
    types::{Account, Nonce, PubAccount, PublicKey},
    Error, Result,
};

/// Reserved raw-store key holding the committed root hash
pub const STATE_KEY: &[u8] = b"STATE";

/// Composed ledger view
#[derive(Debug)]
pub struct LedgerState {
    chain_id: String,
    tally: Tally,
    accounts: AccountStore,
    nonces: NonceRegistry,
    store: StoreHandle,
}

impl LedgerState {
    /// Empty state over `store` (raw keys) and `tree_store` (tree snapshots)
    pub fn new(store: StoreHandle, tree_store: StoreHandle, n_candidates: usize) -> Self {
        Self {
            chain_id: String::new(),
            tally: Tally::new(n_candidates),
            accounts: AccountStore::new(tree_store),
            nonces: NonceRegistry::new(store.clone()),
            store,
        }
    }

    /// Set the chain identifier
    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    /// Chain identifier
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Current tally
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Mutable tally
    pub fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }

    /// Look up an account
    pub fn get_account(&self, pubkey: &PublicKey) -> Result<Account> {
        self.accounts.get_account(pubkey)
    }

    /// Stage an account write
    pub fn set_account(&mut self, pubkey: PublicKey, account: Account) {
        self.accounts.set_account(pubkey, account);
    }

    /// Consume a nonce for `pubkey`; false if already used
    pub fn add_nonce(&mut self, pubkey: &PublicKey, nonce: &Nonce) -> Result<bool> {
        self.nonces.add_nonce(pubkey, nonce)
    }

    /// Independent view sharing the stores. Fails if anything is unsaved.
    pub fn copy(&self) -> Result<Self> {
        Ok(Self {
            chain_id: self.chain_id.clone(),
            tally: self.tally.clone(),
            accounts: self.accounts.copy()?,
            nonces: self.nonces.copy()?,
            store: self.store.clone(),
        })
    }

    /// Persist everything and return the new root hash.
    ///
    /// On error nothing reachable from `STATE` has changed and the staged
    /// nonces and accounts are kept, so the save can be retried.
    pub fn save(&mut self) -> Result<[u8; 32]> {
        let tally_bytes = self.tally.to_bytes()?;
        self.accounts.tree_mut().set(TALLY_KEY, &tally_bytes);

        let root = self.accounts.save()?;

        let mut batch = StoreBatch::new();
        self.nonces.write_to(&mut batch);
        batch.put(TALLY_KEY, &tally_bytes);
        batch.put(STATE_KEY, &root);
        self.store.write_batch(batch)?;
        self.nonces.mark_saved();

        tracing::info!(
            root = %hex::encode_upper(root),
            chain_id = %self.chain_id,
            "Ledger state saved"
        );

        Ok(root)
    }

    /// Whether a state root has ever been saved to the store
    pub fn has_saved_state(&self) -> Result<bool> {
        Ok(self.store.get(STATE_KEY)?.is_some())
    }

    /// Restore the last saved state from the stores
    pub fn load(&mut self) -> Result<()> {
        let root = self
            .store
            .get(STATE_KEY)?
            .ok_or_else(|| Error::NotFound("State root".to_string()))?;
        let root: [u8; 32] = root.as_slice().try_into().map_err(|_| {
            Error::InvalidState(format!("State root has {} bytes, expected 32", root.len()))
        })?;

        self.accounts.load(root)?;

        let tally_bytes = self
            .accounts
            .tree()
            .get(TALLY_KEY)
            .ok_or_else(|| Error::NotFound("Tally".to_string()))?;
        let tally = Tally::from_bytes(tally_bytes)?;

        if tally.len() != self.tally.len() {
            return Err(Error::InvalidState(format!(
                "Stored tally has {} candidates, expected {}",
                tally.len(),
                self.tally.len()
            )));
        }
        self.tally = tally;

        tracing::info!(root = %hex::encode_upper(root), "Ledger state loaded");
        Ok(())
    }

    /// Root hash of the state as it stands, after syncing staged accounts
    pub fn root_hash(&mut self) -> Result<[u8; 32]> {
        self.accounts.sync()?;
        Ok(self.accounts.tree_mut().root_hash())
    }

    /// All accounts in the tree, in key order. Staged writes are not included.
    pub fn accounts(&self) -> impl Iterator<Item = Result<PubAccount>> + '_ {
        self.accounts.tree().iter().filter_map(|(key, value)| {
            let pubkey = PublicKey::from_account_key(key)?;
            Some(Account::from_bytes(value).map(|account| PubAccount::new(pubkey, account)))
        })
    }
}

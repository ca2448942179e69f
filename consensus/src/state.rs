//! Ledger views held by the application
//!
//! - `committed`: state as of the last commit; answers queries
//! - `block`: committed plus the transactions appended in the current block
//! - `mempool`: committed plus the transactions checked since the last commit
//!
//! Block and mempool are independent copies of committed. Neither sees the
//! other's writes; both are replaced on every commit.

use crate::Result;
use tracing::info;
use voting_ledger::LedgerState;

/// Committed, block and mempool views of one ledger
#[derive(Debug)]
pub struct StateViews {
    committed: LedgerState,
    block: LedgerState,
    mempool: LedgerState,
}

impl StateViews {
    /// Derive block and mempool views from a freshly created or loaded state
    pub fn init(committed: LedgerState) -> Result<Self> {
        let block = committed.copy()?;
        let mempool = committed.copy()?;

        Ok(Self {
            committed,
            block,
            mempool,
        })
    }

    /// Last committed state
    pub fn committed(&self) -> &LedgerState {
        &self.committed
    }

    /// In-progress block state
    pub fn block(&self) -> &LedgerState {
        &self.block
    }

    /// Mutable in-progress block state
    pub fn block_mut(&mut self) -> &mut LedgerState {
        &mut self.block
    }

    /// Mempool state
    pub fn mempool(&self) -> &LedgerState {
        &self.mempool
    }

    /// Mutable mempool state
    pub fn mempool_mut(&mut self) -> &mut LedgerState {
        &mut self.mempool
    }

    /// Save the block view, promote it to committed and reset block and mempool.
    ///
    /// On error the views are left as they were.
    pub fn rotate(&mut self) -> Result<[u8; 32]> {
        let root = self.block.save()?;

        let committed = self.block.copy()?;
        let block = committed.copy()?;
        let mempool = committed.copy()?;

        self.committed = committed;
        self.block = block;
        self.mempool = mempool;

        Ok(root)
    }

    /// Tear down, handing back the committed state
    pub fn shutdown(self) -> LedgerState {
        info!(chain_id = %self.committed.chain_id(), "State views shut down");
        self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voting_ledger::{Account, AccountType, MemStore, Nonce, PublicKey};

    fn pk(b: u8) -> PublicKey {
        PublicKey::from_bytes([b; 32])
    }

    fn views() -> StateViews {
        StateViews::init(LedgerState::new(MemStore::handle(), MemStore::handle(), 3)).unwrap()
    }

    #[test]
    fn test_views_are_isolated() {
        let mut views = views();
        views
            .block_mut()
            .set_account(pk(1), Account::new(AccountType::Voter));

        assert!(views.block().get_account(&pk(1)).is_ok());
        assert!(views.mempool().get_account(&pk(1)).is_err());
        assert!(views.committed().get_account(&pk(1)).is_err());
    }

    #[test]
    fn test_rotate_promotes_block() {
        let mut views = views();
        views
            .block_mut()
            .set_account(pk(1), Account::new(AccountType::Admin));
        views
            .mempool_mut()
            .set_account(pk(2), Account::new(AccountType::Voter));

        views.rotate().unwrap();

        for view in [views.committed(), views.block(), views.mempool()] {
            assert!(view.get_account(&pk(1)).is_ok());
            // Mempool staging is discarded
            assert!(view.get_account(&pk(2)).is_err());
        }
    }

    #[test]
    fn test_rotate_clears_nonce_staging() {
        let mut views = views();
        let nonce = Nonce::new(vec![0]);
        assert!(views.mempool_mut().add_nonce(&pk(1), &nonce).unwrap());

        views.rotate().unwrap();

        // Mempool-only nonce was never committed
        assert!(views.block_mut().add_nonce(&pk(1), &nonce).unwrap());
    }

    #[test]
    fn test_rotate_is_idempotent_without_changes() {
        let mut views = views();
        let first = views.rotate().unwrap();
        let second = views.rotate().unwrap();
        assert_eq!(first, second);

        let committed = views.shutdown();
        assert_eq!(committed.tally().len(), 3);
    }
}

//! Host-facing application
//!
//! The consensus host drives the ledger through [`Application`]: transactions
//! are checked against the mempool view, appended to the block view and made
//! durable on commit. Every entry point runs under one lock.

use crate::{
    genesis::Genesis,
    metrics::Metrics,
    query::{QueryPath, ResultGetAccount, ResultGetAccounts, ResultGetTally},
    state::StateViews,
    Config, Error, Result,
};
use parking_lot::Mutex;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use voting_ledger::{
    exec_tx_bytes, Account, LedgerState, MemStore, PublicKey, ResultCode, Storage, StoreHandle,
};

/// Outcome of a host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    /// Result code; only [`ResultCode::Ok`] is success
    pub code: ResultCode,
    /// Payload (root hash on commit, JSON on query)
    pub data: Vec<u8>,
    /// Human-readable detail
    pub log: String,
}

impl TxResult {
    /// Success with a payload
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            code: ResultCode::Ok,
            data,
            log: String::new(),
        }
    }

    /// Failure with a code and log line
    pub fn error(code: ResultCode, log: impl Into<String>) -> Self {
        Self {
            code,
            data: Vec::new(),
            log: log.into(),
        }
    }

    /// Whether the call succeeded
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl From<&Error> for TxResult {
    fn from(err: &Error) -> Self {
        TxResult::error(err.code(), err.to_string())
    }
}

/// Calls a consensus host makes into the application
pub trait Application {
    /// Name and version
    fn info(&self) -> String;

    /// Host-provided option; accepted and ignored
    fn set_option(&self, _key: &str, _value: &str) -> String {
        String::new()
    }

    /// Execute a transaction in the current block
    fn append_tx(&self, tx: &[u8]) -> TxResult;

    /// Execute a transaction against the mempool view
    fn check_tx(&self, tx: &[u8]) -> TxResult;

    /// Persist the block and return the root hash
    fn commit(&self) -> TxResult;

    /// Read-only query of committed state
    fn query(&self, query: &[u8]) -> TxResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxPath {
    Append,
    Check,
}

impl TxPath {
    fn as_str(self) -> &'static str {
        match self {
            TxPath::Append => "append",
            TxPath::Check => "check",
        }
    }
}

/// Voting ledger application
#[derive(Debug)]
pub struct VoteApp {
    views: Mutex<StateViews>,
    metrics: Metrics,
}

impl VoteApp {
    /// Application over the given stores with empty views
    pub fn new(
        store: StoreHandle,
        tree_store: StoreHandle,
        chain_id: &str,
        n_candidates: usize,
    ) -> Result<Self> {
        let state = LedgerState::new(store, tree_store, n_candidates).with_chain_id(chain_id);
        let metrics = Metrics::new()?;
        metrics.set_candidates(n_candidates);

        Ok(Self {
            views: Mutex::new(StateViews::init(state)?),
            metrics,
        })
    }

    /// Application backed by RocksDB at `config.ledger.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::open(&config.ledger)?;
        Self::new(
            storage.state_store(),
            storage.tree_store(),
            &config.chain_id,
            config.n_candidates,
        )
    }

    /// Application over throwaway in-memory stores
    pub fn in_memory(n_candidates: usize) -> Result<Self> {
        Self::new(MemStore::handle(), MemStore::handle(), "", n_candidates)
    }

    /// Restore committed state, or apply genesis if nothing was ever committed,
    /// then commit. Returns the committed root hash.
    pub fn load<F>(&self, genesis: F) -> Result<[u8; 32]>
    where
        F: FnOnce() -> Result<Genesis>,
    {
        let mut views = self.views.lock();
        if views.block().has_saved_state()? {
            views.block_mut().load()?;
            info!("Loaded committed state");
        } else {
            let genesis = genesis()?;
            info!(accounts = genesis.accounts.len(), "No committed state, applying genesis");
            for pub_account in genesis.accounts {
                views
                    .block_mut()
                    .set_account(pub_account.pubkey, pub_account.account);
            }
        }

        self.commit_locked(&mut views)
    }

    /// [`VoteApp::load`] with genesis read from a file
    pub fn load_genesis_file(&self, path: impl AsRef<Path>) -> Result<[u8; 32]> {
        self.load(|| Genesis::from_file(path))
    }

    /// Write an account straight into the block view, bypassing validation.
    /// Takes effect on the next commit.
    pub fn set_account(&self, pubkey: PublicKey, account: Account) {
        self.views.lock().block_mut().set_account(pubkey, account);
    }

    /// Save the block view and rotate views
    pub fn commit_block(&self) -> Result<[u8; 32]> {
        let mut views = self.views.lock();
        self.commit_locked(&mut views)
    }

    fn commit_locked(&self, views: &mut StateViews) -> Result<[u8; 32]> {
        let start = Instant::now();
        let root = views.rotate()?;

        self.metrics.record_commit(start.elapsed().as_secs_f64());
        self.metrics.set_candidates(views.committed().tally().len());

        info!(root = %hex::encode_upper(root), "Block committed");
        Ok(root)
    }

    /// Committed tally
    pub fn get_tally(&self) -> ResultGetTally {
        ResultGetTally {
            tally: self.views.lock().committed().tally().clone(),
        }
    }

    /// Committed account
    pub fn get_account(&self, pubkey: &PublicKey) -> Result<ResultGetAccount> {
        let account = self.views.lock().committed().get_account(pubkey)?;
        Ok(ResultGetAccount { account })
    }

    /// Every committed account, in key order
    pub fn get_accounts(&self) -> Result<ResultGetAccounts> {
        let views = self.views.lock();
        let accounts = views
            .committed()
            .accounts()
            .collect::<voting_ledger::Result<Vec<_>>>()?;
        Ok(ResultGetAccounts::new(accounts))
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop the application, returning the committed state
    pub fn shutdown(self) -> LedgerState {
        self.views.into_inner().shutdown()
    }

    fn exec(&self, tx: &[u8], path: TxPath) -> TxResult {
        let result = {
            let mut views = self.views.lock();
            let state = match path {
                TxPath::Append => views.block_mut(),
                TxPath::Check => views.mempool_mut(),
            };
            exec_tx_bytes(state, tx, path == TxPath::Append)
        };

        match result {
            Ok(()) => {
                self.metrics.record_tx(path.as_str(), ResultCode::Ok);
                TxResult::ok(Vec::new())
            }
            Err(e) => {
                let code = e.code();
                self.metrics.record_tx(path.as_str(), code);
                warn!(path = path.as_str(), code = code.as_u32(), error = %e, "Tx rejected");
                TxResult::error(code, e.to_string())
            }
        }
    }

    fn run_query(&self, path: &str) -> Result<Vec<u8>> {
        let data = match QueryPath::parse(path) {
            QueryPath::Tally => serde_json::to_vec(&self.get_tally())?,
            QueryPath::Accounts => serde_json::to_vec(&self.get_accounts()?)?,
            QueryPath::Account(key) => {
                let pubkey: PublicKey = key.parse()?;
                serde_json::to_vec(&self.get_account(&pubkey)?)?
            }
            QueryPath::Unknown(path) => return Err(Error::UnknownRequest(path.to_string())),
            QueryPath::Other => Vec::new(),
        };
        Ok(data)
    }
}

impl Application for VoteApp {
    fn info(&self) -> String {
        format!("VoteApp v{}", env!("CARGO_PKG_VERSION"))
    }

    fn append_tx(&self, tx: &[u8]) -> TxResult {
        self.exec(tx, TxPath::Append)
    }

    fn check_tx(&self, tx: &[u8]) -> TxResult {
        self.exec(tx, TxPath::Check)
    }

    fn commit(&self) -> TxResult {
        match self.commit_block() {
            Ok(root) => TxResult::ok(root.to_vec()),
            Err(e) => {
                warn!(error = %e, "Commit failed");
                TxResult::from(&e)
            }
        }
    }

    fn query(&self, query: &[u8]) -> TxResult {
        let path = String::from_utf8_lossy(query);

        match self.run_query(&path) {
            Ok(data) => TxResult::ok(data),
            Err(e) => TxResult::from(&e),
        }
    }
}

//! Voting Ledger Core
//!
//! Deterministic state machine for a permissioned voting ledger: signed vote,
//! admin and fork transactions applied against a merkleized account store.
//!
//! # Architecture
//!
//! - **Ballot Tally**: per-candidate counts, all-or-nothing ballot checks
//! - **Nonce Registry**: once-use `{pubkey, nonce}` pairs, staged until save
//! - **Account Store**: accounts in a merkle tree behind a key-ordered write cache
//! - **Ledger State**: the three composed, with copy/save/load
//! - **Execution**: decode, validate, authorize, consume nonce, apply
//!
//! # Invariants
//!
//! - Deterministic replay: same transactions from genesis -> same root hash
//! - A rejected transaction leaves the state untouched
//! - A consumed nonce is never accepted again for the same signer

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod accounts;
pub mod config;
pub mod crypto;
pub mod error;
pub mod exec;
pub mod merkle;
pub mod nonces;
pub mod state;
pub mod storage;
pub mod tally;
pub mod tx;
pub mod types;

// Re-exports
pub use accounts::AccountStore;
pub use config::Config;
pub use crypto::KeyPair;
pub use error::{Error, Result, ResultCode};
pub use exec::{exec_tx, exec_tx_bytes, MAX_TX_SIZE};
pub use merkle::MerkleTree;
pub use nonces::NonceRegistry;
pub use state::LedgerState;
pub use storage::{KvStore, MemStore, Storage, StoreBatch, StoreHandle};
pub use tally::{Ballot, BallotError, Tally};
pub use tx::{AdminTx, ForkTx, Transaction, VoteTx};
pub use types::{Account, AccountType, Nonce, PubAccount, PublicKey, Signature};

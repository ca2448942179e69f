//! Voting Application Shell
//!
//! Connects the voting ledger core to a consensus host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Consensus Host                       │
//! │   orders transactions into blocks                    │
//! └────────────────────┬────────────────────────────────┘
//!                      │ CheckTx / AppendTx / Commit / Query
//!                      ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              VoteApp                                 │
//! │  committed | block | mempool views                   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//!                      ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              Ledger Core                             │
//! │  tally + accounts + nonces over a merkle tree        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Host Methods
//!
//! - **CheckTx**: Execute against the mempool view
//! - **AppendTx**: Execute against the block view
//! - **Commit**: Save the block view, return the root hash, reset views
//! - **Query**: `/tally`, `/accounts`, `/account/<hex>` over committed state

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod abci;
pub mod config;
pub mod error;
pub mod genesis;
pub mod metrics;
pub mod query;
pub mod state;

// Re-exports
pub use abci::{Application, TxResult, VoteApp};
pub use config::Config;
pub use error::{Error, Result};
pub use genesis::Genesis;
pub use metrics::Metrics;
pub use query::{ResultGetAccount, ResultGetAccounts, ResultGetTally};
pub use state::StateViews;

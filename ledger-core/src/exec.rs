//! Transaction execution
//!
//! Every transaction goes through the same gates, in order:
//! size -> decode -> validate -> account lookup -> capability -> nonce -> apply.
//! A failing gate returns before anything in the state has changed.

use crate::{
    state::LedgerState,
    tx::{AdminTx, ForkTx, Transaction, VoteTx},
    types::Account,
    Error, Result,
};
use tracing::{debug, info, trace};

/// Largest accepted transaction, in bytes
pub const MAX_TX_SIZE: usize = 2048;

/// Decode, validate and execute raw transaction bytes
pub fn exec_tx_bytes(state: &mut LedgerState, tx_bytes: &[u8], is_append: bool) -> Result<()> {
    if tx_bytes.len() > MAX_TX_SIZE {
        return Err(Error::Encoding(format!(
            "Tx size {} exceeds maximum {}",
            tx_bytes.len(),
            MAX_TX_SIZE
        )));
    }

    let tx = Transaction::from_bytes(tx_bytes)?;
    tx.validate()?;

    exec_tx(state, &tx, is_append)
}

/// Execute a decoded, validated transaction
pub fn exec_tx(state: &mut LedgerState, tx: &Transaction, is_append: bool) -> Result<()> {
    let pubkey = tx.pubkey();

    let mut account = state.get_account(pubkey).map_err(|e| match e {
        Error::NotFound(_) | Error::Encoding(_) | Error::Serialization(_) => {
            Error::Unauthorized(format!("Error getting account {}: {}", pubkey, e))
        }
        other => other,
    })?;

    let required = tx.required_account_type();
    if account.account_type != required {
        return Err(Error::Unauthorized(format!(
            "Account {} is type {}, not {}",
            pubkey, account.account_type, required
        )));
    }

    if !state.add_nonce(pubkey, tx.nonce())? {
        return Err(Error::BadNonce(format!("Nonce {} already used", tx.nonce())));
    }

    match tx {
        Transaction::Vote(vote) => apply_vote(state, vote),
        Transaction::Admin(admin) => apply_admin(state, admin),
        Transaction::Fork(fork) => apply_fork(fork),
    }

    bump_sequence(&mut account);

    debug!(
        kind = tx.kind(),
        signer = %pubkey,
        nonce = %tx.nonce(),
        append = is_append,
        "Tx executed"
    );

    Ok(())
}

fn apply_vote(state: &mut LedgerState, tx: &VoteTx) {
    let tally = state.tally_mut();
    for (index, ballot) in tx.ballots.iter().enumerate() {
        // A bad ballot is dropped; the rest of the tx still counts
        if let Err(e) = tally.add_ballot(ballot) {
            debug!(signer = %tx.pubkey, ballot = index, error = %e, "Ballot dropped");
        }
    }
}

fn apply_admin(state: &mut LedgerState, tx: &AdminTx) {
    for pub_account in &tx.pub_accounts {
        state.set_account(pub_account.pubkey, pub_account.account.clone());
    }
}

fn apply_fork(tx: &ForkTx) {
    info!(name = %tx.name, signer = %tx.pubkey, "Fork marker accepted");
}

/// The bumped sequence stays on the local copy and is never written back
fn bump_sequence(account: &mut Account) {
    account.sequence += 1;
    trace!(sequence = account.sequence, "Signer sequence bumped");
}

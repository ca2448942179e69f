//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify:
//! - All-or-nothing ballots: a rejected ballot never moves a count
//! - Tally encoding reproduces the counts it was taken from
//! - Account roots do not depend on insertion order
//! - Deterministic replay: a reloaded state reproduces the saved root
//! - Nonces: one acceptance per `{signer, nonce}`

use proptest::prelude::*;
use voting_ledger::{
    exec_tx_bytes, Account, AccountStore, AccountType, Ballot, Error, KeyPair, LedgerState,
    MemStore, Nonce, PublicKey, Tally, Transaction, VoteTx,
};

const N_CANDIDATES: usize = 19;

/// Strategy for ballots that pass every check
fn valid_ballot_strategy() -> impl Strategy<Value = Ballot> {
    (
        prop::sample::subsequence((0..N_CANDIDATES as i32).collect::<Vec<_>>(), 0..=5),
        0usize..=5,
    )
        .prop_map(|(mut candidates, skips)| {
            while candidates.len() < 5 && candidates.len() < skips {
                candidates.push(-1);
            }
            Ballot::new(candidates, "prop")
        })
}

/// Strategy for ballots that break at least one rule
fn invalid_ballot_strategy() -> impl Strategy<Value = Ballot> {
    prop_oneof![
        // Too many entries
        prop::collection::vec(-1i32..N_CANDIDATES as i32, 6..12),
        // Out of range
        (0usize..4, N_CANDIDATES as i32..i32::MAX).prop_map(|(pos, bad)| {
            let mut c: Vec<i32> = (0..4).collect();
            c[pos] = bad;
            c
        }),
        // Negative, not the skip filler
        (i32::MIN..-1).prop_map(|bad| vec![0, bad]),
        // Duplicate
        (0..N_CANDIDATES as i32).prop_map(|c| vec![c, -1, c]),
    ]
    .prop_map(|candidates| Ballot::new(candidates, "bad"))
}

fn pubkey_strategy() -> impl Strategy<Value = PublicKey> {
    any::<[u8; 32]>().prop_map(PublicKey::from_bytes)
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Voter),
        Just(AccountType::Admin),
        Just(AccountType::Corrupt),
    ]
}

fn signed_vote(keypair: &KeyPair, ballots: Vec<Ballot>, nonce: Vec<u8>) -> Vec<u8> {
    let mut tx: Transaction = VoteTx::new(ballots, Nonce::new(nonce), keypair.public_key()).into();
    tx.sign(keypair).unwrap();
    tx.to_bytes().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: invalid ballots leave the tally unchanged
    #[test]
    fn prop_invalid_ballot_no_effect(
        seed in prop::collection::vec(valid_ballot_strategy(), 0..10),
        bad in invalid_ballot_strategy(),
    ) {
        let mut tally = Tally::new(N_CANDIDATES);
        for ballot in &seed {
            tally.add_ballot(ballot).unwrap();
        }
        let before = tally.clone();

        prop_assert!(tally.add_ballot(&bad).is_err());
        prop_assert_eq!(tally, before);
    }

    /// Property: a valid ballot adds exactly one per distinct candidate
    #[test]
    fn prop_valid_ballot_increments(ballot in valid_ballot_strategy()) {
        let mut tally = Tally::new(N_CANDIDATES);
        tally.add_ballot(&ballot).unwrap();

        let selected = ballot.candidates.iter().filter(|&&c| c >= 0).count() as u64;
        prop_assert_eq!(tally.counts().iter().sum::<u64>(), selected);
    }

    /// Property: tally encoding reproduces the counts
    #[test]
    fn prop_tally_round_trip(ballots in prop::collection::vec(valid_ballot_strategy(), 0..50)) {
        let mut tally = Tally::new(N_CANDIDATES);
        for ballot in &ballots {
            tally.add_ballot(ballot).unwrap();
        }

        let decoded = Tally::from_bytes(&tally.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(decoded, tally);
    }

    /// Property: account root is independent of insertion order
    #[test]
    fn prop_account_root_order_independent(
        accounts in prop::collection::btree_map(pubkey_strategy(), account_type_strategy(), 1..30),
    ) {
        let mut forward = AccountStore::new(MemStore::handle());
        let mut backward = AccountStore::new(MemStore::handle());

        for (pubkey, account_type) in &accounts {
            forward.set_account(*pubkey, Account::new(*account_type));
        }
        for (pubkey, account_type) in accounts.iter().rev() {
            backward.set_account(*pubkey, Account::new(*account_type));
        }

        prop_assert_eq!(forward.save().unwrap(), backward.save().unwrap());
    }

    /// Property: a reloaded state reproduces root, tally and accounts
    #[test]
    fn prop_reload_reproduces_state(
        accounts in prop::collection::btree_map(pubkey_strategy(), account_type_strategy(), 0..20),
        ballots in prop::collection::vec(valid_ballot_strategy(), 0..20),
    ) {
        let store = MemStore::handle();
        let tree_store = MemStore::handle();

        let mut state = LedgerState::new(store.clone(), tree_store.clone(), N_CANDIDATES);
        for (pubkey, account_type) in &accounts {
            state.set_account(*pubkey, Account::new(*account_type));
        }
        for ballot in &ballots {
            state.tally_mut().add_ballot(ballot).unwrap();
        }
        let root = state.save().unwrap();

        let mut loaded = LedgerState::new(store, tree_store, N_CANDIDATES);
        loaded.load().unwrap();

        prop_assert_eq!(loaded.root_hash().unwrap(), root);
        prop_assert_eq!(loaded.tally(), state.tally());

        let listed: Vec<_> = loaded.accounts().collect::<voting_ledger::Result<_>>().unwrap();
        prop_assert_eq!(listed.len(), accounts.len());
        for pub_account in listed {
            prop_assert_eq!(Some(&pub_account.account.account_type), accounts.get(&pub_account.pubkey));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Property: each nonce is accepted once, before and after save
    #[test]
    fn prop_nonce_single_use(nonces in prop::collection::btree_set(prop::collection::vec(any::<u8>(), 0..=32), 1..10)) {
        let voter = KeyPair::from_seed(&[7u8; 32]);
        let mut state = LedgerState::new(MemStore::handle(), MemStore::handle(), N_CANDIDATES);
        state.set_account(voter.public_key(), Account::new(AccountType::Voter));

        for nonce in &nonces {
            let tx = signed_vote(&voter, vec![Ballot::new(vec![0], "p")], nonce.clone());
            exec_tx_bytes(&mut state, &tx, true).unwrap();
            prop_assert!(matches!(exec_tx_bytes(&mut state, &tx, true), Err(Error::BadNonce(_))));
        }
        state.save().unwrap();

        let mut next = state.copy().unwrap();
        for nonce in &nonces {
            let tx = signed_vote(&voter, vec![Ballot::new(vec![0], "p")], nonce.clone());
            prop_assert!(matches!(exec_tx_bytes(&mut next, &tx, false), Err(Error::BadNonce(_))));
        }
        prop_assert_eq!(next.tally().counts()[0], nonces.len() as u64);
    }
}

//! Query results over the committed view

use serde::{Deserialize, Serialize};
use voting_ledger::{Account, PubAccount, Tally};

/// Query path for the committed tally
pub const PATH_TALLY: &str = "/tally";
/// Query path for every account
pub const PATH_ACCOUNTS: &str = "/accounts";
/// Query path prefix for one account; followed by the hex public key
pub const PATH_ACCOUNT: &str = "/account/";

/// Result of `get_tally`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultGetTally {
    /// Committed tally
    pub tally: Tally,
}

/// Result of `get_account`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultGetAccount {
    /// Committed account
    pub account: Account,
}

/// Result of `get_accounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultGetAccounts {
    /// Number of accounts listed
    pub num_accounts: usize,

    /// Accounts in key order
    pub accounts: Vec<PubAccount>,
}

impl ResultGetAccounts {
    /// Wrap an account listing
    pub fn new(accounts: Vec<PubAccount>) -> Self {
        Self {
            num_accounts: accounts.len(),
            accounts,
        }
    }
}

/// Parsed query path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPath<'a> {
    /// `/tally`
    Tally,
    /// `/accounts`
    Accounts,
    /// `/account/<hex pubkey>`
    Account(&'a str),
    /// Any other path starting with `/`
    Unknown(&'a str),
    /// Not a path
    Other,
}

impl<'a> QueryPath<'a> {
    /// Classify a query path
    pub fn parse(path: &'a str) -> Self {
        match path {
            PATH_TALLY => QueryPath::Tally,
            PATH_ACCOUNTS => QueryPath::Accounts,
            _ => match path.strip_prefix(PATH_ACCOUNT) {
                Some(key) => QueryPath::Account(key),
                None if path.starts_with('/') => QueryPath::Unknown(path),
                None => QueryPath::Other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voting_ledger::{AccountType, PublicKey};

    #[test]
    fn test_parse_paths() {
        assert_eq!(QueryPath::parse("/tally"), QueryPath::Tally);
        assert_eq!(QueryPath::parse("/accounts"), QueryPath::Accounts);
        assert_eq!(QueryPath::parse("/account/AB"), QueryPath::Account("AB"));
        assert_eq!(QueryPath::parse("/votes"), QueryPath::Unknown("/votes"));
        assert_eq!(QueryPath::parse("/account"), QueryPath::Unknown("/account"));
        assert_eq!(QueryPath::parse("STATE"), QueryPath::Other);
        assert_eq!(QueryPath::parse(""), QueryPath::Other);
    }

    #[test]
    fn test_result_json() {
        let result = ResultGetAccounts::new(vec![PubAccount::new(
            PublicKey::from_bytes([0; 32]),
            Account::new(AccountType::Voter),
        )]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["num_accounts"], 1);
        assert_eq!(json["accounts"][0]["account"]["type"], "voter");

        let tally = ResultGetTally {
            tally: Tally::new(2),
        };
        assert_eq!(
            serde_json::to_string(&tally).unwrap(),
            r#"{"tally":{"counts":[0,0]}}"#
        );
    }
}

//! Genesis accounts
//!
//! ```json
//! {"accounts": [{"pubkey": "…", "account": {"sequence": 0, "type": "admin"}}]}
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use voting_ledger::PubAccount;

/// Initial account set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Accounts written to the first block
    pub accounts: Vec<PubAccount>,
}

impl Genesis {
    /// Parse genesis JSON
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Genesis(format!("Failed to parse genesis JSON: {}", e)))
    }

    /// Read and parse a genesis file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Genesis(format!("Failed to read genesis {}: {}", path.display(), e))
        })?;
        Self::from_json(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voting_ledger::AccountType;

    #[test]
    fn test_parse_genesis() {
        let json = format!(
            r#"{{"accounts":[
                {{"pubkey":"{}","account":{{"sequence":0,"type":"admin"}}}},
                {{"pubkey":"{}","account":{{"sequence":0,"type":"voter"}}}}
            ]}}"#,
            "11".repeat(32),
            "22".repeat(32)
        );

        let genesis = Genesis::from_json(json.as_bytes()).unwrap();
        assert_eq!(genesis.accounts.len(), 2);
        assert_eq!(genesis.accounts[0].account.account_type, AccountType::Admin);
        assert_eq!(genesis.accounts[1].pubkey.as_bytes(), &[0x22; 32]);
    }

    #[test]
    fn test_bad_genesis() {
        assert!(matches!(
            Genesis::from_json(br#"{"accounts":[{"pubkey":"zz"}]}"#),
            Err(Error::Genesis(_))
        ));
        assert!(matches!(
            Genesis::from_file("/nonexistent/genesis.json"),
            Err(Error::Genesis(_))
        ));
    }
}

//! Configuration for the voting node

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node ID
    pub node_id: String,

    /// Chain ID carried by every ledger view
    pub chain_id: String,

    /// Number of candidates on the ballot
    pub n_candidates: usize,

    /// Genesis file, read when no committed state exists
    pub genesis_file: PathBuf,

    /// Ledger storage configuration
    #[serde(default)]
    pub ledger: voting_ledger::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "node-1".to_string(),
            chain_id: "voting-1".to_string(),
            n_candidates: 19,
            genesis_file: PathBuf::from("genesis.json"),
            ledger: voting_ledger::Config::default(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(node_id) = std::env::var("VOTE_NODE_ID") {
            config.node_id = node_id;
        }

        if let Ok(chain_id) = std::env::var("VOTE_CHAIN_ID") {
            config.chain_id = chain_id;
        }

        if let Ok(n) = std::env::var("VOTE_CANDIDATES") {
            config.n_candidates = n
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid VOTE_CANDIDATES: {}", e)))?;
        }

        if let Ok(genesis) = std::env::var("VOTE_GENESIS") {
            config.genesis_file = PathBuf::from(genesis);
        }

        if let Ok(data_dir) = std::env::var("VOTE_DATA_DIR") {
            config.ledger.data_dir = PathBuf::from(data_dir);
        }

        Ok(config)
    }
}

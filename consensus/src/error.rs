//! Error types for the application shell

use thiserror::Error;

/// Result type for application operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] voting_ledger::Error),

    /// Genesis file unreadable or malformed
    #[error("Genesis error: {0}")]
    Genesis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Query path not served
    #[error("Unknown request: {0}")]
    UnknownRequest(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Result code reported to the host for this error
    pub fn code(&self) -> voting_ledger::ResultCode {
        match self {
            Error::Ledger(e) => e.code(),
            Error::UnknownRequest(_) => voting_ledger::ResultCode::UnknownRequest,
            _ => voting_ledger::ResultCode::InternalError,
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

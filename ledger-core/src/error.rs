//! Error types for the voting ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Oversized or malformed transaction bytes, malformed stored records
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Missing account, wrong capability type or bad signature
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Oversized nonce, or nonce already consumed
    #[error("Bad nonce: {0}")]
    BadNonce(String),

    /// Account, tally or state root missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage error (RocksDB or in-memory store)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// State precondition violated or persisted snapshot inconsistent
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Result code reported to the host for this error
    pub fn code(&self) -> ResultCode {
        match self {
            Error::Encoding(_) => ResultCode::EncodingError,
            Error::Unauthorized(_) => ResultCode::Unauthorized,
            Error::BadNonce(_) => ResultCode::BadNonce,
            Error::NotFound(_) => ResultCode::NotFound,
            Error::Storage(_)
            | Error::Serialization(_)
            | Error::InvalidState(_)
            | Error::Config(_)
            | Error::Io(_) => ResultCode::InternalError,
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Status codes carried by host results. `Ok` is the only success code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    /// Success
    Ok = 0,
    /// Store or tree persistence failure
    InternalError = 1,
    /// Oversized or malformed transaction
    EncodingError = 2,
    /// Nonce oversized or replayed
    BadNonce = 3,
    /// Authorization failure
    Unauthorized = 4,
    /// Lookup miss
    NotFound = 5,
    /// Query path not understood
    UnknownRequest = 6,
}

impl ResultCode {
    /// Numeric wire value
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Whether this is the success code
    pub fn is_ok(self) -> bool {
        self == ResultCode::Ok
    }
}

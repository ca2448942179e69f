//! Core types for the voting ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode for stored records, JSON on the wire)
//! - Fixed-length keys (32-byte public keys index the account tree)
//! - Hex rendering of raw bytes in JSON, matching the transaction wire format

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an account key in the merkle tree
pub const ACCOUNT_KEY_LEN: usize = 32;

/// Ed25519 verifying key identifying an account
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Canonical fixed-length key under which the account is stored
    pub fn account_key(&self) -> [u8; ACCOUNT_KEY_LEN] {
        self.0
    }

    /// Parse from a tree key; `None` unless the key has account-key length
    pub fn from_account_key(key: &[u8]) -> Option<Self> {
        let bytes: [u8; ACCOUNT_KEY_LEN] = key.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| crate::Error::Encoding(format!("Invalid public key hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            crate::Error::Encoding(format!("Public key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hex(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_hex(deserializer)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| de::Error::invalid_length(bytes.len(), &"32 bytes"))?;
        Ok(Self(bytes))
    }
}

/// Digital signature (Ed25519)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Verify signature
    pub fn verify(&self, message: &[u8], public_key: &PublicKey) -> bool {
        crate::crypto::verify_signature(message, self, public_key)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode_upper(self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hex(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_hex(deserializer)?;
        let bytes: [u8; 64] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| de::Error::invalid_length(bytes.len(), &"64 bytes"))?;
        Ok(Self(bytes))
    }
}

/// Once-use replay token chosen by the signer
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Create from bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the nonce is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode_upper(&self.0))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.0))
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hex(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_hex(deserializer).map(Self)
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}

fn deserialize_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex::decode(&s).map_err(de::Error::custom)
}

/// Account capability type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// May submit vote transactions
    Voter,
    /// May submit admin and fork transactions
    Admin,
    /// Revoked; may submit nothing
    Corrupt,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountType::Voter => "voter",
            AccountType::Admin => "admin",
            AccountType::Corrupt => "corrupt",
        };
        f.write_str(name)
    }
}

/// Account record stored under its public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Number of transactions committed
    pub sequence: u64,

    /// Type for capabilities
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

impl Account {
    /// Fresh account of the given type
    pub fn new(account_type: AccountType) -> Self {
        Self {
            sequence: 0,
            account_type,
        }
    }

    /// Stored encoding
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode stored bytes, refusing truncated or padded buffers
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        if bytes.is_empty() {
            return Err(crate::Error::Encoding("Account bytes are empty".to_string()));
        }
        let account: Account = bincode::deserialize(bytes)?;

        let consumed = bincode::serialized_size(&account)?;
        if consumed != bytes.len() as u64 {
            return Err(crate::Error::Encoding(format!(
                "Account has {} trailing bytes",
                bytes.len() as u64 - consumed
            )));
        }

        Ok(account)
    }
}

/// Public key paired with its account, as found in admin txs, genesis and listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubAccount {
    /// Account key
    pub pubkey: PublicKey,

    /// Account record
    pub account: Account,
}

impl PubAccount {
    /// Pair a key with an account
    pub fn new(pubkey: PublicKey, account: Account) -> Self {
        Self { pubkey, account }
    }
}

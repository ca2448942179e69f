//! Transaction model
//!
//! Wire form is a JSON object with a `"type"` discriminator:
//!
//! ```json
//! {"type":"vote","ballots":[{"c":[0,2],"s":"north"}],"nonce":"00","pubkey":"…","signature":"…"}
//! ```
//!
//! The signed payload is the same object minus `type` and `signature`, with
//! the fields in a fixed order per variant.

use crate::{
    crypto::KeyPair,
    tally::Ballot,
    types::{AccountType, Nonce, PubAccount, PublicKey, Signature},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Largest accepted nonce, in bytes
pub const MAX_NONCE_SIZE: usize = 32;

/// Cast ballots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTx {
    /// Ballots to add to the tally
    pub ballots: Vec<Ballot>,
    /// Replay token
    pub nonce: Nonce,
    /// Signer
    pub pubkey: PublicKey,
    /// Signature over [`Transaction::sign_bytes`]
    #[serde(default)]
    pub signature: Signature,
}

/// Create or retype accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminTx {
    /// Accounts to upsert
    pub pub_accounts: Vec<PubAccount>,
    /// Replay token
    pub nonce: Nonce,
    /// Signer
    pub pubkey: PublicKey,
    /// Signature over [`Transaction::sign_bytes`]
    #[serde(default)]
    pub signature: Signature,
}

/// Governance marker with no ledger effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkTx {
    /// Fork label
    pub name: String,
    /// Replay token
    pub nonce: Nonce,
    /// Signer
    pub pubkey: PublicKey,
    /// Signature over [`Transaction::sign_bytes`]
    #[serde(default)]
    pub signature: Signature,
}

/// Any ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transaction {
    /// Ballot submission
    Vote(VoteTx),
    /// Account administration
    Admin(AdminTx),
    /// Fork marker
    Fork(ForkTx),
}

#[derive(Serialize)]
struct VoteSignBytes<'a> {
    ballots: &'a [Ballot],
    nonce: &'a Nonce,
    pubkey: &'a PublicKey,
}

#[derive(Serialize)]
struct AdminSignBytes<'a> {
    nonce: &'a Nonce,
    pub_accounts: &'a [PubAccount],
    pubkey: &'a PublicKey,
}

#[derive(Serialize)]
struct ForkSignBytes<'a> {
    name: &'a str,
    nonce: &'a Nonce,
    pubkey: &'a PublicKey,
}

impl Transaction {
    /// Short name of the variant, as used in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Vote(_) => "vote",
            Transaction::Admin(_) => "admin",
            Transaction::Fork(_) => "fork",
        }
    }

    /// Signer public key
    pub fn pubkey(&self) -> &PublicKey {
        match self {
            Transaction::Vote(tx) => &tx.pubkey,
            Transaction::Admin(tx) => &tx.pubkey,
            Transaction::Fork(tx) => &tx.pubkey,
        }
    }

    /// Replay token
    pub fn nonce(&self) -> &Nonce {
        match self {
            Transaction::Vote(tx) => &tx.nonce,
            Transaction::Admin(tx) => &tx.nonce,
            Transaction::Fork(tx) => &tx.nonce,
        }
    }

    /// Attached signature
    pub fn signature(&self) -> &Signature {
        match self {
            Transaction::Vote(tx) => &tx.signature,
            Transaction::Admin(tx) => &tx.signature,
            Transaction::Fork(tx) => &tx.signature,
        }
    }

    /// Account type the signer must hold
    pub fn required_account_type(&self) -> AccountType {
        match self {
            Transaction::Vote(_) => AccountType::Voter,
            Transaction::Admin(_) | Transaction::Fork(_) => AccountType::Admin,
        }
    }

    /// Canonical signed payload: compact JSON without the signature
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Transaction::Vote(tx) => serde_json::to_vec(&VoteSignBytes {
                ballots: &tx.ballots,
                nonce: &tx.nonce,
                pubkey: &tx.pubkey,
            }),
            Transaction::Admin(tx) => serde_json::to_vec(&AdminSignBytes {
                nonce: &tx.nonce,
                pub_accounts: &tx.pub_accounts,
                pubkey: &tx.pubkey,
            }),
            Transaction::Fork(tx) => serde_json::to_vec(&ForkSignBytes {
                name: &tx.name,
                nonce: &tx.nonce,
                pubkey: &tx.pubkey,
            }),
        };
        bytes.map_err(|e| Error::Encoding(format!("Failed to encode sign bytes: {}", e)))
    }

    /// Structural checks: nonce size, then signature
    pub fn validate(&self) -> Result<()> {
        let nonce = self.nonce();
        if nonce.len() > MAX_NONCE_SIZE {
            return Err(Error::BadNonce(format!(
                "Nonce too big ({}). Max is {}",
                nonce.len(),
                MAX_NONCE_SIZE
            )));
        }

        let message = self.sign_bytes()?;
        if !self.signature().verify(&message, self.pubkey()) {
            return Err(Error::Unauthorized("Invalid signature".to_string()));
        }

        Ok(())
    }

    /// Fill in the signature. `keypair` should match the pubkey field.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<()> {
        let signature = keypair.sign(&self.sign_bytes()?);
        match self {
            Transaction::Vote(tx) => tx.signature = signature,
            Transaction::Admin(tx) => tx.signature = signature,
            Transaction::Fork(tx) => tx.signature = signature,
        }
        Ok(())
    }

    /// Wire encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| Error::Encoding(format!("Failed to encode transaction: {}", e)))
    }

    /// Decode wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Encoding(format!("Malformed transaction: {}", e)))
    }
}

impl VoteTx {
    /// Unsigned vote from `pubkey`
    pub fn new(ballots: Vec<Ballot>, nonce: Nonce, pubkey: PublicKey) -> Self {
        Self {
            ballots,
            nonce,
            pubkey,
            signature: Signature::default(),
        }
    }
}

impl AdminTx {
    /// Unsigned admin tx from `pubkey`
    pub fn new(pub_accounts: Vec<PubAccount>, nonce: Nonce, pubkey: PublicKey) -> Self {
        Self {
            pub_accounts,
            nonce,
            pubkey,
            signature: Signature::default(),
        }
    }
}

impl ForkTx {
    /// Unsigned fork marker from `pubkey`
    pub fn new(name: impl Into<String>, nonce: Nonce, pubkey: PublicKey) -> Self {
        Self {
            name: name.into(),
            nonce,
            pubkey,
            signature: Signature::default(),
        }
    }
}

impl From<VoteTx> for Transaction {
    fn from(tx: VoteTx) -> Self {
        Transaction::Vote(tx)
    }
}

impl From<AdminTx> for Transaction {
    fn from(tx: AdminTx) -> Self {
        Transaction::Admin(tx)
    }
}

impl From<ForkTx> for Transaction {
    fn from(tx: ForkTx) -> Self {
        Transaction::Fork(tx)
    }
}

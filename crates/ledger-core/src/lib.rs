pub mod canonical;
pub mod chain;
pub mod constants;
pub mod error;
pub mod mine;
pub mod pow;

use serde::{Deserialize, Serialize};
use serde_json::Number;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub use canonical::to_canonical_string;
pub use chain::Ledger;
pub use error::{LedgerError, Result};
pub use pow::{CancelFlag, ProofOfWork};

pub type Hash = [u8; 32];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    /// Any JSON number, kept exactly as submitted: `10` and `10.0` encode
    /// differently and so hash differently.
    pub amount: Number,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the Unix epoch, fractional part included.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// The key-sorted encoding that is both hashed and used as proof input.
    pub fn canonical_string(&self) -> Result<String> {
        to_canonical_string(self)
    }

    /// Lowercase hex SHA-256 of the canonical encoding.
    pub fn hash(&self) -> Result<String> {
        Ok(sha256_hex(self.canonical_string()?.as_bytes()))
    }
}

pub fn sha256(data: &[u8]) -> Hash {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Wall-clock seconds since the epoch. A clock set before 1970 reads as zero.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod pow;

pub use error::{LedgerError, Result};
pub use ledger::{create_genesis, Ledger};
pub use mine::{MinerConfig, SharedLedger};
pub use pow::{CancelFlag, ProofOfWork};

pub type Hash = [u8; constants::HASH_SIZE];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: i64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: i64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }
}

/// Compact JSON array with object keys in lexicographic order, so the
/// rendering does not depend on struct layout or map implementation.
/// An empty list renders as `[]`.
pub fn render_transactions(txs: &[Transaction]) -> String {
    let items: Vec<serde_json::Value> = txs
        .iter()
        .map(|t| {
            json!({
                "amount": t.amount,
                "receiver": t.receiver,
                "sender": t.sender,
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Pre-image of the block digest: index, timestamp, length-prefixed
    /// transaction rendering, proof, previous hash.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let txs = render_transactions(&self.transactions);
        let mut bytes = Vec::with_capacity(8 + 8 + 8 + txs.len() + 8 + self.previous_hash.len());
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(txs.len() as u64).to_le_bytes());
        bytes.extend_from_slice(txs.as_bytes());
        bytes.extend_from_slice(&self.proof.to_le_bytes());
        bytes.extend_from_slice(self.previous_hash.as_bytes());
        bytes
    }

    pub fn hash(&self) -> Hash {
        sha256(&self.hash_bytes())
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; constants::HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("proof search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("no proof exists for last proof {last_proof} in the u64 range")]
    ProofSpaceExhausted { last_proof: u64 },

    #[error("ledger has no genesis block")]
    MissingGenesis,

    #[error("genesis block is malformed: {0}")]
    InvalidGenesis(&'static str),

    #[error("block {index} does not link to its predecessor (expected {expected}, found {found})")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },

    #[error("block at position {position} has index {found}")]
    IndexGap { position: usize, found: u64 },

    #[error("block {index} carries proof {proof} which fails the difficulty check")]
    InvalidProof { index: u64, proof: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

use crate::{
    constants::DEFAULT_DIFFICULTY_BITS,
    error::Result,
    ledger::Ledger,
    pow::{CancelFlag, ProofOfWork},
    Block, Transaction,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Required leading zero bits of the proof digest.
    pub difficulty_bits: u32,
    /// Spread the proof search over the rayon pool.
    pub parallel: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            difficulty_bits: DEFAULT_DIFFICULTY_BITS,
            parallel: false,
        }
    }
}

impl From<MinerConfig> for ProofOfWork {
    fn from(cfg: MinerConfig) -> Self {
        ProofOfWork::new(cfg.difficulty_bits).with_parallel(cfg.parallel)
    }
}

/// Mine one block on an exclusively owned ledger: find a proof for the tip,
/// then move the whole pool into a new block.
pub fn mine(ledger: &mut Ledger, pow: &ProofOfWork, cancel: &CancelFlag) -> Result<Block> {
    let last_proof = ledger.last_block()?.proof;
    let proof = pow.find_proof(last_proof, cancel)?;
    let txs = ledger.take_pool();
    let block = ledger.append_block(txs, proof)?.clone();
    info!(
        index = block.index,
        proof,
        txs = block.transactions.len(),
        hash = %block.hash_hex(),
        "mined block"
    );
    Ok(block)
}

/// Cloneable handle to the single ledger instance of a process. Every
/// mutation goes through one mutex; the proof search runs outside it.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
    pow: ProofOfWork,
}

impl SharedLedger {
    pub fn new(config: MinerConfig) -> Self {
        Self::from_ledger(Ledger::new(), config)
    }

    pub fn from_ledger(ledger: Ledger, config: MinerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
            pow: config.into(),
        }
    }

    // Critical sections never leave the ledger half-updated, so a panic in
    // another holder does not invalidate the state.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn proof_of_work(&self) -> ProofOfWork {
        self.pow
    }

    pub fn get_chain(&self) -> Vec<Block> {
        self.lock().chain().to_vec()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.lock().pending().to_vec()
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn submit_transaction(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: i64,
    ) {
        self.lock()
            .submit_transaction(Transaction::new(sender, receiver, amount));
    }

    pub fn verify(&self) -> Result<()> {
        self.lock().verify_with_difficulty(&self.pow)
    }

    /// Find a proof for the current tip and append a block holding the pool.
    ///
    /// The tip is re-read after the search; if another miner appended in the
    /// meantime the search restarts from the new tip. Taking the pool and
    /// appending happen under one lock, so no submission is lost or counted
    /// twice. On cancellation the chain and pool are untouched.
    pub fn mine(&self, cancel: &CancelFlag) -> Result<Block> {
        let (mut tip_index, mut last_proof) = {
            let ledger = self.lock();
            let last = ledger.last_block()?;
            (last.index, last.proof)
        };
        loop {
            let proof = self.pow.find_proof(last_proof, cancel)?;

            let mut ledger = self.lock();
            let last = ledger.last_block()?;
            if last.index != tip_index {
                debug!(
                    searched_for = tip_index,
                    tip = last.index,
                    "tip moved during proof search, retrying"
                );
                tip_index = last.index;
                last_proof = last.proof;
                continue;
            }

            let txs = ledger.take_pool();
            let block = ledger.append_block(txs, proof)?.clone();
            info!(
                index = block.index,
                proof,
                txs = block.transactions.len(),
                hash = %block.hash_hex(),
                "mined block"
            );
            return Ok(block);
        }
    }
}

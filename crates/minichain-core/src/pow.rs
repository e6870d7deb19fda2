use crate::{
    constants::{CANCEL_CHECK_INTERVAL, DEFAULT_DIFFICULTY_BITS},
    error::{LedgerError, Result},
    sha256, Hash,
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::debug;

/// Shared stop signal for a running proof search.
///
/// A child flag reports cancelled when it or any of its ancestors is
/// cancelled, so a node can hold one flag for shutdown and hand each request
/// its own.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    own: Arc<AtomicBool>,
    parent: Option<Arc<CancelFlag>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            own: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.own.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.own.load(Ordering::Relaxed)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Digest of the decimal concatenation `"{last_proof}{proof}"`.
pub fn proof_digest(last_proof: u64, proof: u64) -> Hash {
    sha256(format!("{last_proof}{proof}").as_bytes())
}

pub fn valid_proof(last_proof: u64, proof: u64, difficulty_bits: u32) -> bool {
    count_leading_zero_bits(&proof_digest(last_proof, proof)) >= difficulty_bits
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    pub difficulty_bits: u32,
    pub parallel: bool,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty_bits: DEFAULT_DIFFICULTY_BITS,
            parallel: false,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty_bits: u32) -> Self {
        Self {
            difficulty_bits,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn valid(&self, last_proof: u64, proof: u64) -> bool {
        valid_proof(last_proof, proof, self.difficulty_bits)
    }

    /// Smallest non-negative `proof` such that `valid(last_proof, proof)`.
    /// Runs until a proof is found or `cancel` fires.
    pub fn find_proof(&self, last_proof: u64, cancel: &CancelFlag) -> Result<u64> {
        debug!(
            last_proof,
            difficulty = self.difficulty_bits,
            parallel = self.parallel,
            "searching for proof"
        );
        if self.parallel {
            self.search_parallel(last_proof, cancel)
        } else {
            self.search_sequential(last_proof, cancel)
        }
    }

    fn search_sequential(&self, last_proof: u64, cancel: &CancelFlag) -> Result<u64> {
        let mut proof = 0u64;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(LedgerError::Cancelled { attempts: proof });
            }
            if self.valid(last_proof, proof) {
                return Ok(proof);
            }
            proof = proof
                .checked_add(1)
                .ok_or(LedgerError::ProofSpaceExhausted { last_proof })?;
        }
    }

    fn search_parallel(&self, last_proof: u64, cancel: &CancelFlag) -> Result<u64> {
        let batch = rayon::current_num_threads().max(1) as u64 * CANCEL_CHECK_INTERVAL;
        self.search_batched(last_proof, cancel, batch)
    }

    // Each batch is split across the pool; `find_first` keeps the leftmost
    // hit, and batches run in ascending order, so the answer matches the
    // sequential search.
    fn search_batched(&self, last_proof: u64, cancel: &CancelFlag, batch: u64) -> Result<u64> {
        let mut base = 0u64;
        loop {
            if cancel.is_cancelled() {
                return Err(LedgerError::Cancelled { attempts: base });
            }
            let end = base.saturating_add(batch.max(1) - 1);
            let hit = (base..=end)
                .into_par_iter()
                .find_first(|proof| self.valid(last_proof, *proof));
            if let Some(proof) = hit {
                return Ok(proof);
            }
            if end == u64::MAX {
                return Err(LedgerError::ProofSpaceExhausted { last_proof });
            }
            base = end + 1;
        }
    }
}

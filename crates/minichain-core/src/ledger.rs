use crate::{
    constants::GENESIS_PROOF,
    error::{LedgerError, Result},
    pow::ProofOfWork,
    Block, Transaction,
};
use tracing::debug;

/// A zero-transaction genesis block with fixed proof and empty prev-hash.
pub fn create_genesis() -> Block {
    Block::new(0, vec![], GENESIS_PROOF, String::new())
}

/// The chain plus the pool of transactions waiting for the next block.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pool: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            chain: vec![create_genesis()],
            pool: Vec::new(),
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::MissingGenesis)
    }

    pub fn submit_transaction(&mut self, tx: Transaction) {
        self.pool.push(tx);
        debug!(pending = self.pool.len(), "transaction pooled");
    }

    /// Build the successor of the current tip and append it. The proof is
    /// taken as given.
    pub fn append_block(&mut self, transactions: Vec<Transaction>, proof: u64) -> Result<&Block> {
        let last = self.last_block()?;
        let block = Block::new(last.index + 1, transactions, proof, last.hash_hex());
        self.chain.push(block);
        self.last_block()
    }

    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    /// Snapshot the pool and leave it empty.
    pub fn take_pool(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pool)
    }

    /// Check genesis shape, index sequence and hash links.
    pub fn verify(&self) -> Result<()> {
        let genesis = self.chain.first().ok_or(LedgerError::MissingGenesis)?;
        if genesis.index != 0 {
            return Err(LedgerError::InvalidGenesis("index is not zero"));
        }
        if !genesis.previous_hash.is_empty() {
            return Err(LedgerError::InvalidGenesis("previous hash is not empty"));
        }
        for (position, pair) in self.chain.windows(2).enumerate() {
            let (prev, block) = (&pair[0], &pair[1]);
            if block.index != prev.index + 1 {
                return Err(LedgerError::IndexGap {
                    position: position + 1,
                    found: block.index,
                });
            }
            let expected = prev.hash_hex();
            if block.previous_hash != expected {
                return Err(LedgerError::BrokenLink {
                    index: block.index,
                    expected,
                    found: block.previous_hash.clone(),
                });
            }
        }
        Ok(())
    }

    /// `verify` plus a proof check of every non-genesis block against its
    /// predecessor.
    pub fn verify_with_difficulty(&self, pow: &ProofOfWork) -> Result<()> {
        self.verify()?;
        for pair in self.chain.windows(2) {
            let (prev, block) = (&pair[0], &pair[1]);
            if !pow.valid(prev.proof, block.proof) {
                return Err(LedgerError::InvalidProof {
                    index: block.index,
                    proof: block.proof,
                });
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_block_example() {
        let genesis = create_genesis();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.proof, 100);
        assert_eq!(genesis.previous_hash, "");
        assert!(genesis.transactions.is_empty());
        assert!(genesis.is_genesis());
    }

    #[test]
    fn genesis_hash_is_idempotent() {
        let genesis = create_genesis();
        assert_eq!(genesis.hash(), genesis.hash());
    }

    #[test]
    fn new_ledger_has_only_genesis() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.last_block().unwrap().index, 0);
        ledger.verify().unwrap();
    }

    #[test]
    fn submit_keeps_order_and_duplicates() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(Transaction::new("A", "B", 10));
        ledger.submit_transaction(Transaction::new("", "", -5));
        ledger.submit_transaction(Transaction::new("A", "B", 10));
        assert_eq!(
            ledger.pending(),
            &[
                Transaction::new("A", "B", 10),
                Transaction::new("", "", -5),
                Transaction::new("A", "B", 10),
            ]
        );
    }

    #[test]
    fn append_block_links_to_tip() {
        let mut ledger = Ledger::new();
        let genesis_hash = ledger.last_block().unwrap().hash_hex();
        let txs = vec![Transaction::new("A", "B", 10)];
        let block = ledger.append_block(txs.clone(), 12345).unwrap().clone();
        assert_eq!(block.index, 1);
        assert_eq!(block.proof, 12345);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.transactions, txs);

        let second = ledger.append_block(vec![], 1).unwrap().clone();
        assert_eq!(second.index, 2);
        assert_eq!(second.previous_hash, block.hash_hex());
        ledger.verify().unwrap();
    }

    #[test]
    fn take_pool_empties_pool() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(Transaction::new("A", "B", 1));
        let taken = ledger.take_pool();
        assert_eq!(taken.len(), 1);
        assert!(ledger.pending().is_empty());

        ledger.submit_transaction(Transaction::new("C", "D", 2));
        ledger.clear_pool();
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn empty_chain_is_reported() {
        let mut ledger = Ledger::new();
        ledger.chain_mut().clear();
        assert!(matches!(ledger.last_block(), Err(LedgerError::MissingGenesis)));
        assert!(matches!(
            ledger.append_block(vec![], 0),
            Err(LedgerError::MissingGenesis)
        ));
        assert!(matches!(ledger.verify(), Err(LedgerError::MissingGenesis)));
    }

    #[test]
    fn tampering_breaks_link() {
        let mut ledger = Ledger::new();
        ledger
            .append_block(vec![Transaction::new("A", "B", 10)], 1)
            .unwrap();
        ledger.append_block(vec![], 2).unwrap();
        ledger.chain_mut()[1].transactions[0].amount = 1_000;
        match ledger.verify() {
            Err(LedgerError::BrokenLink { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected broken link, got {other:?}"),
        }
    }

    #[test]
    fn index_gap_is_reported() {
        let mut ledger = Ledger::new();
        ledger.append_block(vec![], 1).unwrap();
        ledger.chain_mut()[1].index = 5;
        assert!(matches!(
            ledger.verify(),
            Err(LedgerError::IndexGap { position: 1, found: 5 })
        ));
    }

    #[test]
    fn malformed_genesis_is_reported() {
        let mut ledger = Ledger::new();
        ledger.chain_mut()[0].previous_hash = "00".into();
        assert!(matches!(ledger.verify(), Err(LedgerError::InvalidGenesis(_))));
    }

    #[test]
    fn verify_with_difficulty_checks_proofs() {
        let pow = ProofOfWork::new(8);
        let mut ledger = Ledger::new();
        ledger.append_block(vec![], 226).unwrap();
        ledger.verify_with_difficulty(&pow).unwrap();

        ledger.append_block(vec![], 0).unwrap();
        assert!(matches!(
            ledger.verify_with_difficulty(&pow),
            Err(LedgerError::InvalidProof { index: 2, proof: 0 })
        ));
    }
}

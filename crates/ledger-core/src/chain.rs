use crate::{
    constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, REWARD_AMOUNT, REWARD_SENDER},
    error::{LedgerError, Result},
    unix_timestamp, Block, ProofOfWork, Transaction,
};
use serde_json::Number;
use tracing::{debug, info};

/// In-memory chain plus the buffer of transactions waiting for the next block.
///
/// Not synchronized; callers that share one ledger across tasks wrap it in a
/// single mutex so queueing and forging never interleave.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    pow: ProofOfWork,
    clock: fn() -> f64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// A ledger holding only the genesis block, validating at the node's
    /// default difficulty.
    pub fn new() -> Self {
        Self::with_pow(ProofOfWork::node_default())
    }

    pub fn with_pow(pow: ProofOfWork) -> Self {
        Self::with_clock(pow, unix_timestamp)
    }

    /// Like [`Ledger::with_pow`], stamping blocks with `clock` instead of the
    /// wall clock.
    pub fn with_clock(pow: ProofOfWork, clock: fn() -> f64) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            pow,
            clock,
        };
        ledger.create_genesis();
        ledger
    }

    fn create_genesis(&mut self) {
        let genesis = self.append_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        info!(timestamp = genesis.timestamp, "genesis block created");
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn hash(block: &Block) -> Result<String> {
        block.hash()
    }

    /// Buffer a transaction; returns the index of the block that will hold it.
    pub fn queue_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Result<u64> {
        let next = self.last_block()?.index + 1;
        let tx = Transaction::new(sender, recipient, amount);
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount = %tx.amount, "transaction queued");
        self.pending.push(tx);
        Ok(next)
    }

    /// Commit the pending buffer into a new block. The proof is not checked
    /// here; `previous_hash` defaults to the hash of the current last block.
    pub fn forge_block(&mut self, proof: u64, previous_hash: Option<String>) -> Result<Block> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.last_block()?.hash()?,
        };
        Ok(self.append_block(proof, previous_hash))
    }

    fn append_block(&mut self, proof: u64, previous_hash: String) -> Block {
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: (self.clock)(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.chain.push(block.clone());
        block
    }

    /// Check `proof` against the canonical encoding of the last block.
    pub fn is_valid_proof(&self, proof: u64) -> Result<bool> {
        let block_string = self.last_block()?.canonical_string()?;
        Ok(self.pow.is_valid(&block_string, proof))
    }

    /// Accept a miner's proof for the last block: on success forge the next
    /// block and queue the reward for `miner_id` into the following one.
    /// Returns `None` (state untouched) for an invalid or stale proof.
    pub fn submit_proof(&mut self, proof: u64, miner_id: &str) -> Result<Option<Block>> {
        let last = self.last_block()?;
        let block_string = last.canonical_string()?;
        if !self.pow.is_valid(&block_string, proof) {
            debug!(proof, index = last.index, "rejected proof");
            return Ok(None);
        }
        let previous_hash = last.hash()?;
        let block = self.forge_block(proof, Some(previous_hash))?;
        self.queue_transaction(REWARD_SENDER, miner_id, REWARD_AMOUNT)?;
        info!(index = block.index, proof, miner = miner_id, "new block forged");
        Ok(Some(block))
    }

    /// Check every link: consecutive indices, `previous_hash` matching the
    /// hash of the block before it, genesis sentinel on the first block.
    pub fn verify_chain(&self) -> Result<bool> {
        let Some(first) = self.chain.first() else {
            return Err(LedgerError::EmptyChain);
        };
        if first.index != 1 || first.previous_hash != GENESIS_PREVIOUS_HASH {
            return Ok(false);
        }
        for pair in self.chain.windows(2) {
            if pair[1].index != pair[0].index + 1 || pair[1].previous_hash != pair[0].hash()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_NOW: f64 = 1_600_000_000.0;

    fn fixed_clock() -> f64 {
        FIXED_NOW
    }

    fn valid_proof_for_last(ledger: &Ledger) -> u64 {
        let s = ledger.last_block().unwrap().canonical_string().unwrap();
        ledger.pow().find_proof(&s).unwrap()
    }

    #[test]
    fn genesis_block_example() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.last_block().unwrap();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 100);
        assert_eq!(genesis.previous_hash, "The beginning, like the end.");
        assert!(genesis.transactions.is_empty());
        assert!(ledger.pending().is_empty());
        assert!(ledger.verify_chain().unwrap());
    }

    #[test]
    fn queue_returns_next_index_regardless_of_buffer_size() {
        let mut ledger = Ledger::new();
        for i in 0..5 {
            assert_eq!(ledger.queue_transaction("a", "b", i).unwrap(), 2);
        }
        assert_eq!(ledger.pending().len(), 5);
        ledger.forge_block(1, None).unwrap();
        assert_eq!(ledger.queue_transaction("a", "b", 1).unwrap(), 3);
    }

    #[test]
    fn forge_flushes_buffer_in_order() {
        let mut ledger = Ledger::new();
        ledger.queue_transaction("A", "B", 10).unwrap();
        ledger.queue_transaction("C", "D", 5).unwrap();
        let before = ledger.pending().to_vec();
        let block = ledger.forge_block(7, None).unwrap();
        assert_eq!(block.transactions, before);
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.last_block().unwrap(), &block);
    }

    #[test]
    fn forge_without_previous_hash_links_to_tip() {
        let mut ledger = Ledger::new();
        for proof in 0..4 {
            ledger.queue_transaction("x", "y", proof).unwrap();
            ledger.forge_block(proof, None).unwrap();
        }
        let chain = ledger.chain();
        assert_eq!(chain.len(), 5);
        for i in 1..chain.len() {
            assert_eq!(chain[i].index, chain[i - 1].index + 1);
            assert_eq!(chain[i].previous_hash, Ledger::hash(&chain[i - 1]).unwrap());
        }
        assert!(ledger.verify_chain().unwrap());
    }

    #[test]
    fn end_to_end_example() {
        let mut ledger = Ledger::new();
        ledger.queue_transaction("A", "B", 10).unwrap();
        ledger.queue_transaction("C", "D", 5).unwrap();
        let block = ledger.forge_block(100, Some("X".to_string())).unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(
            block.transactions,
            vec![Transaction::new("A", "B", 10), Transaction::new("C", "D", 5)]
        );
        assert_eq!(block.proof, 100);
        assert_eq!(block.previous_hash, "X");
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.queue_transaction("E", "F", 1).unwrap(), 3);
        // An explicit bogus hash breaks the link.
        assert!(!ledger.verify_chain().unwrap());
    }

    #[test]
    fn submit_valid_proof_forges_and_rewards() {
        let mut ledger = Ledger::new();
        ledger.queue_transaction("A", "B", 10).unwrap();
        let genesis_hash = ledger.last_block().unwrap().hash().unwrap();
        let proof = valid_proof_for_last(&ledger);

        let block = ledger.submit_proof(proof, "miner-1").unwrap().expect("forged");
        assert_eq!(block.index, 2);
        assert_eq!(block.proof, proof);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.transactions, vec![Transaction::new("A", "B", 10)]);
        assert_eq!(ledger.pending(), &[Transaction::new("0", "miner-1", 1)]);
        assert!(ledger.verify_chain().unwrap());
    }

    #[test]
    fn submit_invalid_proof_leaves_state_alone() {
        let mut ledger = Ledger::new();
        ledger.queue_transaction("A", "B", 10).unwrap();
        let s = ledger.last_block().unwrap().canonical_string().unwrap();
        let bad = (0u64..).find(|p| !ledger.pow().is_valid(&s, *p)).unwrap();

        assert!(!ledger.is_valid_proof(bad).unwrap());
        assert!(ledger.submit_proof(bad, "miner-1").unwrap().is_none());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn fixed_clock_makes_genesis_reproducible() {
        let ledger = Ledger::with_clock(ProofOfWork::node_default(), fixed_clock);
        let genesis = ledger.last_block().unwrap();
        assert_eq!(genesis.timestamp, FIXED_NOW);
        assert_eq!(
            genesis.hash().unwrap(),
            "f83d6705afff05b59fb56a8799b1a85341c1e2ff0984b450c5a423a98bcd11c5"
        );
        assert_eq!(valid_proof_for_last(&ledger), 14309);
    }

    #[test]
    fn same_proof_cannot_be_submitted_twice() {
        let mut ledger = Ledger::with_clock(ProofOfWork::node_default(), fixed_clock);
        assert!(ledger.submit_proof(14309, "m").unwrap().is_some());

        // Block 2 is fully determined by the fixed clock, and 14309 does not
        // satisfy it.
        assert_eq!(
            ledger.last_block().unwrap().canonical_string().unwrap(),
            concat!(
                r#"{"index": 2, "previous_hash": "#,
                r#""f83d6705afff05b59fb56a8799b1a85341c1e2ff0984b450c5a423a98bcd11c5", "#,
                r#""proof": 14309, "timestamp": 1600000000.0, "transactions": []}"#
            )
        );
        assert!(!ledger.is_valid_proof(14309).unwrap());
        assert!(ledger.submit_proof(14309, "m").unwrap().is_none());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pending(), &[Transaction::new("0", "m", 1)]);
    }

    #[test]
    fn real_and_integer_amounts_are_buffered_as_given() {
        let mut ledger = Ledger::new();
        let half = Number::from_f64(2.5).unwrap();
        assert_eq!(ledger.queue_transaction("A", "B", half.clone()).unwrap(), 2);
        assert_eq!(ledger.queue_transaction("C", "D", 10).unwrap(), 2);
        let block = ledger.forge_block(1, None).unwrap();
        assert_eq!(block.transactions[0].amount, half);
        assert_eq!(block.transactions[1].amount, Number::from(10));
        assert!(block
            .canonical_string()
            .unwrap()
            .contains(r#"{"amount": 2.5, "recipient": "B", "sender": "A"}, {"amount": 10, "#));
    }

    #[test]
    fn custom_difficulty_is_used_for_validation() {
        let ledger = Ledger::with_pow(ProofOfWork::new(1).unwrap());
        assert_eq!(ledger.pow().difficulty(), 1);
        let proof = valid_proof_for_last(&ledger);
        assert!(ledger.is_valid_proof(proof).unwrap());
    }

    #[test]
    fn empty_chain_is_reported() {
        let ledger = Ledger {
            chain: Vec::new(),
            pending: Vec::new(),
            pow: ProofOfWork::node_default(),
            clock: fixed_clock,
        };
        assert!(ledger.is_empty());
        assert!(matches!(ledger.last_block(), Err(LedgerError::EmptyChain)));
        assert!(matches!(ledger.verify_chain(), Err(LedgerError::EmptyChain)));
    }

    #[test]
    fn failed_queue_leaves_buffer_empty() {
        let mut ledger = Ledger {
            chain: Vec::new(),
            pending: Vec::new(),
            pow: ProofOfWork::node_default(),
            clock: fixed_clock,
        };
        assert!(matches!(
            ledger.queue_transaction("A", "B", 10),
            Err(LedgerError::EmptyChain)
        ));
        assert!(ledger.pending().is_empty());
    }
}

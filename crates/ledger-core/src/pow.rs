use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    canonical::to_canonical_string,
    constants::{
        CANCEL_POLL_INTERVAL, DEFAULT_MINER_DIFFICULTY, DEFAULT_NODE_DIFFICULTY, HASH_HEX_SIZE,
    },
    error::{LedgerError, Result},
    Hash,
};

/// Shared stop signal for a running proof search.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Proof-of-work oracle: a proof `p` is valid for `block_string` when the hex
/// SHA-256 of `block_string` followed by the decimal digits of `p` starts with
/// `difficulty` zero characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Result<Self> {
        if difficulty == 0 || difficulty > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidDifficulty(difficulty));
        }
        Ok(Self { difficulty })
    }

    /// The difficulty a node checks submitted proofs against.
    pub fn node_default() -> Self {
        Self {
            difficulty: DEFAULT_NODE_DIFFICULTY,
        }
    }

    /// The (stricter) difficulty the remote miner searches at.
    pub fn miner_default() -> Self {
        Self {
            difficulty: DEFAULT_MINER_DIFFICULTY,
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn is_valid(&self, block_string: &str, proof: u64) -> bool {
        let mut hasher = Sha256::new();
        hasher.update(block_string.as_bytes());
        hasher.update(proof.to_string().as_bytes());
        let digest = hasher.finalize();
        let mut h = [0u8; 32];
        h.copy_from_slice(&digest[..]);
        count_leading_zero_nibbles(&h) as usize >= self.difficulty
    }

    /// Scan nonces upward from zero and return the first valid one. Runs until
    /// a proof is found; `None` only if the whole `u64` range fails.
    pub fn find_proof(&self, block_string: &str) -> Option<u64> {
        self.find_proof_cancellable(block_string, &CancelFlag::new())
    }

    /// Like [`find_proof`](Self::find_proof) but gives up with `None` once
    /// `cancel` is raised.
    pub fn find_proof_cancellable(&self, block_string: &str, cancel: &CancelFlag) -> Option<u64> {
        for proof in 0..=u64::MAX {
            if proof % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                debug!(proof, "proof search cancelled");
                return None;
            }
            if self.is_valid(block_string, proof) {
                return Some(proof);
            }
        }
        None
    }

    /// Canonically encode a block (typed or raw JSON) and search for its proof.
    /// This is what a remote miner runs on the block it fetched from a node.
    pub fn find_proof_for_block<T: Serialize + ?Sized>(
        &self,
        block: &T,
        cancel: &CancelFlag,
    ) -> Result<Option<u64>> {
        let block_string = to_canonical_string(block)?;
        Ok(self.find_proof_cancellable(&block_string, cancel))
    }
}

/// Number of leading zero hex digits in a digest.
pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

pub const GENESIS_PREVIOUS_HASH: &str = "The beginning, like the end.";
pub const GENESIS_PROOF: u64 = 100;

/// Leading zero hex digits the node demands of a submitted proof.
pub const DEFAULT_NODE_DIFFICULTY: usize = 3;
/// Leading zero hex digits the remote miner searches for.
pub const DEFAULT_MINER_DIFFICULTY: usize = 4;

pub const REWARD_SENDER: &str = "0";
pub const REWARD_AMOUNT: u64 = 1;

pub const MSG_BLOCK_FORGED: &str = "New Block Forged";
pub const MSG_INVALID_PROOF: &str = "Proof was invalid or already submitted.";
pub const MSG_MISSING_VALUES: &str = "Missing values";

/// Nonces handed to the thread pool per round of the parallel search.
pub const PARALLEL_WINDOW: u64 = 1 << 14;
/// How often (in attempts) the sequential search polls its cancel flag.
pub const CANCEL_POLL_INTERVAL: u64 = 1 << 10;

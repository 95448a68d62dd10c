use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The chain has no blocks. Construction always appends genesis, so
    /// seeing this means an invariant was broken.
    #[error("chain is empty")]
    EmptyChain,

    #[error("canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("difficulty must be between 1 and 64 hex digits, got {0}")]
    InvalidDifficulty(usize),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

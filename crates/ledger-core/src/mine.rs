use crate::{constants::PARALLEL_WINDOW, pow::CancelFlag, ProofOfWork};
use rayon::prelude::*;
use tracing::{debug, info};

/// Searches nonces in parallel, one window of `PARALLEL_WINDOW` consecutive
/// nonces at a time. Rayon splits each window across threads and `find_first`
/// keeps the lowest hit, so the result equals what `ProofOfWork::find_proof`
/// returns. The cancel flag is checked between windows.
pub fn find_proof_parallel(
    pow: &ProofOfWork,
    block_string: &str,
    cancel: &CancelFlag,
) -> Option<u64> {
    let mut start = 0u64;
    loop {
        if cancel.is_cancelled() {
            debug!(start, "parallel proof search cancelled");
            return None;
        }
        let end = start.saturating_add(PARALLEL_WINDOW);
        let found = (start..end)
            .into_par_iter()
            .find_first(|proof| pow.is_valid(block_string, *proof));

        if let Some(proof) = found {
            info!(proof, difficulty = pow.difficulty(), "found proof");
            return Some(proof);
        }
        if end == u64::MAX {
            return None;
        }
        start = end;
    }
}

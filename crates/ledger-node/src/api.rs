use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    Json,
};
use ledger_core::{
    constants::{MSG_BLOCK_FORGED, MSG_INVALID_PROOF},
    mine::find_proof_parallel,
    Block, CancelFlag, Transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::{debug, info};

use crate::{constants::HELLO, error::ApiError, view, AppState};

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

#[derive(Deserialize)]
pub struct TxIn {
    sender: Option<String>,
    recipient: Option<String>,
    /// Any JSON number; strings and other types fail to deserialize.
    amount: Option<Number>,
}

#[derive(Deserialize)]
pub struct MineIn {
    proof: Option<u64>,
    id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MineOut {
    Forged {
        message: &'static str,
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    },
    Rejected {
        message: &'static str,
    },
}

#[derive(Serialize)]
pub struct ChainOut {
    chain: Vec<Block>,
    length: usize,
}

#[derive(Serialize)]
pub struct LastBlockOut {
    last_block: Block,
}

pub async fn hello() -> Html<String> {
    Html(format!("<body><h2>Hi</h2><p>{HELLO}</p></body>"))
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn new_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TxIn>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(tx) = payload?;
    let (Some(sender), Some(recipient), Some(amount)) = (tx.sender, tx.recipient, tx.amount)
    else {
        return Err(ApiError::missing(&["sender", "recipient", "amount"]));
    };

    let index = state
        .ledger
        .lock()
        .await
        .queue_transaction(sender, recipient, amount)?;
    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: format!("Transactions will be included in block {index}"),
        }),
    ))
}

/// Validate a miner's proof for the last block. Validation, forging and the
/// reward all happen under one lock, so a proof is accepted at most once.
pub async fn mine(
    State(state): State<AppState>,
    payload: Result<Json<MineIn>, JsonRejection>,
) -> Result<Json<MineOut>, ApiError> {
    let Json(req) = payload?;
    let (Some(proof), Some(id)) = (req.proof, req.id) else {
        return Err(ApiError::missing(&["proof", "id"]));
    };

    let mut ledger = state.ledger.lock().await;
    match ledger.submit_proof(proof, &state.node_id)? {
        Some(block) => {
            info!(index = block.index, proof, miner = %id, "accepted proof");
            Ok(Json(MineOut::Forged {
                message: MSG_BLOCK_FORGED,
                index: block.index,
                transactions: block.transactions,
                proof: block.proof,
                previous_hash: block.previous_hash,
            }))
        }
        None => {
            debug!(proof, miner = %id, "proof rejected");
            Ok(Json(MineOut::Rejected {
                message: MSG_INVALID_PROOF,
            }))
        }
    }
}

pub async fn full_chain(State(state): State<AppState>) -> Json<ChainOut> {
    let ledger = state.ledger.lock().await;
    Json(ChainOut {
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}

pub async fn last_block(State(state): State<AppState>) -> Result<Json<LastBlockOut>, ApiError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(LastBlockOut {
        last_block: ledger.last_block()?.clone(),
    }))
}

/// Raises the flag when dropped, stopping a search whose request went away.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Search for the next proof on this node and forge the block, then show the
/// chain. The lock is released during the search; if another miner moves the
/// tip meanwhile, the search restarts on the new tip.
pub async fn mine_chain(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let guard = CancelOnDrop(CancelFlag::new());
    loop {
        let (block_string, tip_index, pow) = {
            let ledger = state.ledger.lock().await;
            let last = ledger.last_block()?;
            (last.canonical_string()?, last.index, *ledger.pow())
        };

        let cancel = guard.0.clone();
        let proof = tokio::task::spawn_blocking(move || {
            find_proof_parallel(&pow, &block_string, &cancel)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("proof search panicked: {e}")))?
        .ok_or_else(|| ApiError::Internal("proof search ended without a proof".into()))?;

        let mut ledger = state.ledger.lock().await;
        let last = ledger.last_block()?;
        if last.index != tip_index {
            debug!(tip_index, current = last.index, "tip moved during search, retrying");
            continue;
        }
        let previous_hash = last.hash()?;
        let block = ledger.forge_block(proof, Some(previous_hash))?;
        info!(index = block.index, proof, "forged block from local search");
        return Ok(Html(view::render_chain(ledger.chain(), &block)));
    }
}

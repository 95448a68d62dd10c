//! Remote mining client: poll a node for its last block, search for a proof
//! locally and submit it.

use std::path::{Path, PathBuf};

use ledger_core::{constants::MSG_BLOCK_FORGED, CancelFlag, LedgerError, ProofOfWork};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Number, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum MinerError {
    #[error("non-JSON response from {url} (status {status}): {body}")]
    NonJsonResponse {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("response from {url} has no `{field}`")]
    MissingField { url: String, field: &'static str },

    #[error("request to node failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not read miner id from {}: {source}", .path.display())]
    IdFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("proof search failed: {0}")]
    Search(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Thin JSON client for a ledger node.
#[derive(Clone, Debug)]
pub struct NodeClient {
    http: Client,
    base: String,
}

#[derive(Serialize)]
struct TxOut<'a> {
    sender: &'a str,
    recipient: &'a str,
    amount: &'a Number,
}

impl NodeClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The node's `last_block` object, left untyped so it is re-encoded
    /// exactly as received.
    pub async fn last_block(&self) -> Result<Value, MinerError> {
        let url = format!("{}/last_block", self.base);
        let mut body = read_json(&url, self.http.get(&url).send().await?).await?;
        let block = body.get_mut("last_block").map(Value::take);
        block.ok_or(MinerError::MissingField {
            url,
            field: "last_block",
        })
    }

    /// Submit a proof and classify the node's reply.
    pub async fn submit_proof(&self, proof: u64, id: &str) -> Result<MineReply, MinerError> {
        let url = format!("{}/mine", self.base);
        let resp = self
            .http
            .post(&url)
            .json(&json!({ "proof": proof, "id": id }))
            .send()
            .await?;
        let body = read_json(&url, resp).await?;
        parse_mine_reply(&url, &body)
    }

    pub async fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: &Number,
    ) -> Result<Value, MinerError> {
        let url = format!("{}/transaction/new", self.base);
        let tx = TxOut {
            sender,
            recipient,
            amount,
        };
        let resp = self.http.post(&url).json(&tx).send().await?;
        read_json(&url, resp).await
    }

    pub async fn chain(&self) -> Result<Value, MinerError> {
        let url = format!("{}/chain", self.base);
        read_json(&url, self.http.get(&url).send().await?).await
    }
}

async fn read_json(url: &str, resp: reqwest::Response) -> Result<Value, MinerError> {
    let status = resp.status();
    let body = resp.text().await?;
    parse_json_body(url, status, body)
}

fn parse_json_body(url: &str, status: StatusCode, body: String) -> Result<Value, MinerError> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(error = %e, "response body is not JSON");
            Err(MinerError::NonJsonResponse {
                url: url.to_string(),
                status,
                body,
            })
        }
    }
}

/// What the node said about a submitted proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MineReply {
    Forged { index: u64 },
    Rejected { message: String },
}

fn parse_mine_reply(url: &str, body: &Value) -> Result<MineReply, MinerError> {
    let missing = |field| MinerError::MissingField {
        url: url.to_string(),
        field,
    };
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("message"))?;
    if message != MSG_BLOCK_FORGED {
        return Ok(MineReply::Rejected {
            message: message.to_string(),
        });
    }
    let index = body
        .get("index")
        .and_then(Value::as_u64)
        .ok_or_else(|| missing("index"))?;
    Ok(MineReply::Forged { index })
}

/// Read the miner's identifier, dropping trailing whitespace and newlines.
pub fn read_id(path: &Path) -> Result<String, MinerError> {
    let raw = std::fs::read_to_string(path).map_err(|source| MinerError::IdFile {
        path: path.to_path_buf(),
        source,
    })?;
    let id = raw.trim_end().to_string();
    if id.is_empty() {
        warn!(path = %path.display(), "miner id file is empty");
    }
    Ok(id)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    Forged { index: u64, coins_mined: u64 },
    Rejected { message: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MinerReport {
    pub rounds: u64,
    pub coins_mined: u64,
}

pub struct Miner {
    client: NodeClient,
    id: String,
    pow: ProofOfWork,
    max_rounds: Option<u64>,
}

impl Miner {
    pub fn new(client: NodeClient, id: impl Into<String>, pow: ProofOfWork) -> Self {
        Self {
            client,
            id: id.into(),
            pow,
            max_rounds: None,
        }
    }

    /// Stop after this many submissions instead of running forever.
    pub fn with_max_rounds(mut self, rounds: Option<u64>) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Mine until `cancel` is raised or the round limit is hit. Any network
    /// failure, non-JSON reply or reply missing a field ends the loop with an
    /// error.
    pub async fn run(
        &self,
        cancel: &CancelFlag,
        mut on_round: impl FnMut(&RoundOutcome),
    ) -> Result<MinerReport, MinerError> {
        let mut report = MinerReport::default();
        info!(node = %self.client.base(), id = %self.id, difficulty = self.pow.difficulty(), "miner started");

        while self.max_rounds.map_or(true, |max| report.rounds < max) {
            if cancel.is_cancelled() {
                break;
            }
            let block = self.client.last_block().await?;

            let pow = self.pow;
            let search_cancel = cancel.clone();
            let proof = tokio::task::spawn_blocking(move || {
                pow.find_proof_for_block(&block, &search_cancel)
            })
            .await
            .map_err(|e| MinerError::Search(e.to_string()))??;
            let Some(proof) = proof else {
                info!("search cancelled");
                break;
            };

            let reply = self.client.submit_proof(proof, &self.id).await?;
            report.rounds += 1;

            let outcome = match reply {
                MineReply::Forged { index } => {
                    report.coins_mined += 1;
                    RoundOutcome::Forged {
                        index,
                        coins_mined: report.coins_mined,
                    }
                }
                MineReply::Rejected { message } => RoundOutcome::Rejected { message },
            };
            debug!(proof, ?outcome, "round finished");
            on_round(&outcome);
        }

        Ok(report)
    }
}

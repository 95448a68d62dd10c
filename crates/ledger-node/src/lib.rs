//! HTTP node wrapping one shared [`Ledger`].
pub mod api;
pub mod constants;
pub mod error;
pub mod view;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use ledger_core::Ledger;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    /// Every read and write of the chain and pending buffer goes through this lock.
    pub ledger: Arc<Mutex<Ledger>>,
    /// Recipient of mining rewards.
    pub node_id: Arc<str>,
}

impl AppState {
    pub fn new(ledger: Ledger, node_id: impl Into<String>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            node_id: Arc::from(node_id.into()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::hello))
        .route("/health", get(api::health))
        .route("/transaction/new", post(api::new_transaction))
        .route("/mine", post(api::mine))
        .route("/chain", get(api::full_chain))
        .route("/last_block", get(api::last_block))
        .route("/minechain", get(api::mine_chain))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

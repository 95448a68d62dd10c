use anyhow::Context;
use clap::Parser;
use ledger_core::{constants::DEFAULT_NODE_DIFFICULTY, Ledger, ProofOfWork};
use ledger_node::{constants::DEFAULT_LISTEN, router, AppState};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Single-node proof-of-work ledger served over HTTP")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Leading zero hex digits a submitted proof must produce
    #[arg(long, default_value_t = DEFAULT_NODE_DIFFICULTY)]
    difficulty: usize,

    /// Identifier credited with mining rewards (random when omitted)
    #[arg(long)]
    node_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let pow = ProofOfWork::new(args.difficulty).context("invalid --difficulty")?;
    let node_id = args
        .node_id
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let state = AppState::new(Ledger::with_pow(pow), node_id.clone());

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("invalid --listen address {}", args.listen))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%node_id, difficulty = pow.difficulty(), "ledger-node listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "could not listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

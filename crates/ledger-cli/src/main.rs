use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_cli::{
    miner::{read_id, Miner, NodeClient, RoundOutcome},
    DEFAULT_ID_FILE, DEFAULT_NODE_URL,
};
use ledger_core::{constants::DEFAULT_MINER_DIFFICULTY, CancelFlag, ProofOfWork};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client and remote miner for the ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the last block, search for a proof, submit it; repeat until interrupted
    Mine {
        /// Node base URL
        #[arg(default_value = DEFAULT_NODE_URL)]
        node: String,
        /// File holding this miner's identifier
        #[arg(long, default_value = DEFAULT_ID_FILE)]
        id_file: PathBuf,
        /// Leading zero hex digits to search for
        #[arg(long, default_value_t = DEFAULT_MINER_DIFFICULTY)]
        difficulty: usize,
        /// Stop after this many submissions
        #[arg(long)]
        rounds: Option<u64>,
    },
    /// Submit a transaction
    Submit {
        /// Node base URL
        #[arg(long, default_value = DEFAULT_NODE_URL)]
        node: String,
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount, any JSON number (`10`, `2.5`)
        #[arg(long)]
        amount: serde_json::Number,
    },
    /// Print the node's full chain
    Chain {
        /// Node base URL
        #[arg(long, default_value = DEFAULT_NODE_URL)]
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Mine {
            node,
            id_file,
            difficulty,
            rounds,
        } => {
            let id = read_id(&id_file)?;
            println!("ID is {id}");
            let pow = ProofOfWork::new(difficulty).context("invalid --difficulty")?;

            let cancel = CancelFlag::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupted, stopping after the current search");
                    on_signal.cancel();
                }
            });

            let miner = Miner::new(NodeClient::new(node), id, pow).with_max_rounds(rounds);
            let report = miner
                .run(&cancel, |outcome| match outcome {
                    RoundOutcome::Forged { coins_mined, .. } => {
                        println!("Total coins mined: {coins_mined}")
                    }
                    RoundOutcome::Rejected { message } => println!("{message}"),
                })
                .await
                .context("mining stopped")?;
            info!(rounds = report.rounds, coins = report.coins_mined, "miner finished");
        }
        Command::Submit {
            node,
            sender,
            recipient,
            amount,
        } => {
            let body = NodeClient::new(node)
                .submit_transaction(&sender, &recipient, &amount)
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Chain { node } => {
            let body = NodeClient::new(node).chain().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}

//! Portfolio Sync - Worker Binary
//!
//! Runs one integration operation per invocation. Scheduling and retries
//! belong to whatever invokes the binary (cron, a job queue).
//!
//! # Usage
//!
//! ```bash
//! # Push a product and its customer to the platform and start the transfer
//! sync-worker transfer --product 0192a0e4-7c1e-7d2a-9b51-3f0c2d4e5a61
//!
//! # Handle the next event of the product's stream
//! sync-worker pull --product 0192a0e4-7c1e-7d2a-9b51-3f0c2d4e5a61 [--cursor 41]
//!
//! # Handle events until the stream is drained or the transfer completed
//! sync-worker catch-up --product 0192a0e4-7c1e-7d2a-9b51-3f0c2d4e5a61
//! ```
//!
//! Configuration comes from `config/sync_worker.toml` and `SYNC__*`
//! environment variables; see `interface_worker::config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use core_kernel::ProductId;
use interface_worker::{Worker, WorkerConfig};

#[derive(Debug, Parser)]
#[command(name = "sync-worker", version, about = "Portfolio platform integration worker")]
struct Cli {
    /// Configuration file, without extension
    #[arg(long, default_value = interface_worker::config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the stock transfer pipeline for a product
    Transfer {
        #[arg(long)]
        product: Uuid,
    },
    /// Handle the next event of a product's stream
    Pull {
        #[arg(long)]
        product: Uuid,
        /// Last handled event id; defaults to the audit trail
        #[arg(long)]
        cursor: Option<i64>,
    },
    /// Handle events until the stream is drained or a terminal event
    CatchUp {
        #[arg(long)]
        product: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = WorkerConfig::load(&cli.config).context("loading worker configuration")?;
    init_tracing(&config.log_level, cli.json_logs);

    let worker = Worker::connect(&config).await.context("connecting worker")?;

    match cli.command {
        Command::Transfer { product } => {
            let product_id = ProductId::from_uuid(product);
            match worker.transfer(product_id).await {
                Ok(report) => {
                    tracing::info!(product_id = %product_id, "Stock transfer finished");
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(failure) => {
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                    return Err(failure.into());
                }
            }
        }
        Command::Pull { product, cursor } => {
            let product_id = ProductId::from_uuid(product);
            match worker.pull(product_id, cursor).await? {
                Some(cursor) => println!("{}", cursor),
                None => tracing::info!(product_id = %product_id, "No new event"),
            }
        }
        Command::CatchUp { product } => {
            let product_id = ProductId::from_uuid(product);
            let cursors = worker.catch_up(product_id).await?;
            tracing::info!(product_id = %product_id, pulled = cursors.len(), "Catch-up finished");
            println!("{}", serde_json::to_string(&cursors)?);
        }
    }

    Ok(())
}

/// Initializes the tracing subscriber
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

use anyhow::Context;
use clap::Parser;
use crapsvault_simulator::{Config, Simulator};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: PathBuf,

    /// Overrides the number of epochs in the config file
    #[arg(short, long)]
    epochs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let mut config: Config = serde_yaml::from_str(&raw).context("failed to parse config")?;
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    let config = config.validate().context("invalid config")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // Play the table
    let mut simulator = Simulator::new(config).await;
    let summary = simulator.run().await;
    info!(
        epochs = summary.epochs,
        height = summary.height,
        treasury = summary.treasury.balance,
        "simulation complete"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to encode summary")?
    );

    Ok(())
}

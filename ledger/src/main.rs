//! Ledger reader CLI entry point.
//!
//! Prints the entries of the detection audit contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use vigil_ledger::config::LedgerConfig;
use vigil_ledger::reader::{render_record, LedgerReader};
use vigil_ledger::rpc::RpcClient;

/// Read-only client for the detection audit ledger.
#[derive(Parser)]
#[command(name = "vigil-ledger", version, about)]
struct Cli {
    /// Config file (defaults to $VIGIL_LEDGER_CONFIG or ./ledger.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the JSON-RPC endpoint.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Subcommand to execute (defaults to `list`).
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Print every stored entry.
    List,
    /// Print only the number of stored entries.
    Count,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    vigil::logging::init_cli("warn")?;

    let config_path = cli
        .config
        .or_else(|| std::env::var("VIGIL_LEDGER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("ledger.toml"));
    let mut config = LedgerConfig::load(&config_path)?;
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }

    let rpc = RpcClient::new(
        config.endpoint()?,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let address = config.contract_address()?;
    config.verify_abi()?;
    let reader = LedgerReader::new(rpc, address);

    match reader.check_connection().await {
        Ok(version) => {
            info!(node = %version, contract = %reader.address(), "connected");
            println!("Connected to Ethereum network.");
        }
        Err(e) => {
            anyhow::bail!("failed to connect to Ethereum network at {}: {e}", config.rpc_url);
        }
    }

    match cli.command.unwrap_or(Command::List) {
        Command::Count => {
            let count = reader.log_count().await?;
            println!("Total logs stored: {count}");
        }
        Command::List => {
            if let Err(e) = list(&reader).await {
                anyhow::bail!("Error retrieving logs: {e}");
            }
        }
    }
    Ok(())
}

/// Print the count, then each entry as it is fetched.
async fn list(reader: &LedgerReader) -> Result<(), vigil_ledger::LedgerError> {
    let count = reader.log_count().await?;
    println!("Total logs stored: {count}");
    for index in 0..count {
        let record = reader.entry(index).await?;
        println!("{}", render_record(index, &record));
    }
    Ok(())
}

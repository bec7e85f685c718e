//! `document-ledger`: hash a document, record or check it on-chain, and log the attempt.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::Notify;

use document_ledger::app::orchestrator::prefixed;
use document_ledger::app::render::{render_table, run_render_loop};
use document_ledger::app::{upload_status, verify_status, LedgerClient, LedgerDispatcher, Orchestrator};
use document_ledger::ethereum::{AccountApproval, AutoApprove, EthereumGateway, TerminalApproval};
use document_ledger::infra::config::{GatewayConfig, LedgerClientConfig};
use document_ledger::infra::telemetry;
use document_ledger::storage::ledger::DEFAULT_LIST_LIMIT;

#[derive(Parser)]
#[command(
    name = "document-ledger",
    version,
    about = "Record document hashes on-chain and keep an audit ledger of every attempt"
)]
struct Cli {
    /// Approve wallet access without prompting (scripted use).
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect the wallet and show account and balance.
    Connect,
    /// Hash a file and record the hash on-chain.
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Hash a file and check whether the hash is recorded on-chain.
    Verify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the 0x-prefixed SHA-256 digest of a file.
    Hash {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Show the most recent ledger entries.
    Ledger {
        /// Keep refreshing until Ctrl+C.
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Clone, Copy)]
enum Action {
    Connect,
    Upload,
    Verify,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let ledger_config = LedgerClientConfig::from_env()?;

    match cli.command {
        Command::Hash { file } => {
            let digest = document_ledger::hash_file(&file)?;
            println!("{}", prefixed(&digest));
            Ok(ExitCode::SUCCESS)
        }
        Command::Ledger { watch } => show_ledger(&ledger_config, watch).await,
        Command::Connect => run_action(&ledger_config, cli.yes, Action::Connect, None).await,
        Command::Upload { file } => run_action(&ledger_config, cli.yes, Action::Upload, Some(file)).await,
        Command::Verify { file } => run_action(&ledger_config, cli.yes, Action::Verify, Some(file)).await,
    }
}

async fn show_ledger(config: &LedgerClientConfig, watch: bool) -> anyhow::Result<ExitCode> {
    let client = LedgerClient::from_config(config)?;

    if !watch {
        return match client.fetch_recent(DEFAULT_LIST_LIMIT as usize).await {
            Ok(records) => {
                println!("{}", render_table(&records));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Failed to load ledger: {}", e);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let shutdown = Arc::new(Notify::new());
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.notify_one();
        }
    });

    run_render_loop(client, config.refresh_interval, shutdown, |table| {
        // Clear screen, cursor home.
        print!("\x1b[2J\x1b[H");
        println!("{}", table);
    })
    .await;
    Ok(ExitCode::SUCCESS)
}

async fn run_action(
    ledger_config: &LedgerClientConfig,
    auto_approve: bool,
    action: Action,
    file: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let gateway_config = GatewayConfig::from_env()?;
    let approval: Arc<dyn AccountApproval> = if auto_approve {
        Arc::new(AutoApprove)
    } else {
        Arc::new(TerminalApproval)
    };
    let gateway = Arc::new(EthereumGateway::new(gateway_config, approval));

    let dispatcher = Arc::new(LedgerDispatcher::spawn(
        LedgerClient::from_config(ledger_config)?,
        ledger_config.queue_capacity,
    ));
    let orchestrator = Orchestrator::new(gateway, dispatcher.clone());

    let succeeded = match orchestrator.connect().await {
        Ok(session) => {
            println!("{}", session.wallet_info());
            match action {
                Action::Connect => true,
                Action::Upload => {
                    let result = orchestrator.upload(file.as_deref()).await;
                    println!("{}", upload_status(&result));
                    if let Ok(uploaded) = &result {
                        println!("Transaction: {}", uploaded.transaction_hash);
                    }
                    result.is_ok()
                }
                Action::Verify => {
                    let result = orchestrator.verify(file.as_deref()).await;
                    println!("{}", verify_status(&result));
                    result.is_ok()
                }
            }
        }
        Err(e) => {
            println!("Failed to connect wallet: {}", e);
            false
        }
    };

    dispatcher
        .close(ledger_config.timeout + Duration::from_secs(1))
        .await;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

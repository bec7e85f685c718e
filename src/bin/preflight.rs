use alloy::primitives::utils::format_ether;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;

use document_ledger::infra::config::{GatewayConfig, LedgerClientConfig};
use document_ledger::infra::telemetry;
use document_ledger::ethereum::{AutoApprove, ContractArtifact, EthereumGateway};
use document_ledger::LedgerClient;
use std::sync::Arc;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--skip-ledger]\n\
         \n\
         Requires env vars:\n\
           ETH_RPC_URL, WALLET_PRIVATE_KEY\n\
         Optional:\n\
           CONTRACT_ARTIFACT, ETH_EXPECTED_CHAIN_ID, LEDGER_URL\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    telemetry::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let skip_ledger = args.iter().any(|a| a == "--skip-ledger");

    // Force-read config (nice error messages if missing)
    let gateway_config = GatewayConfig::from_env()?;
    let ledger_config = LedgerClientConfig::from_env()?;

    println!("> Preflight:");
    println!("  ETH_RPC_URL={}", gateway_config.rpc_url);
    println!("  CONTRACT_ARTIFACT={}", gateway_config.artifact_path.display());
    println!("  LEDGER_URL={}", ledger_config.base_url);

    // Network reachability + expected chain id
    let gateway = EthereumGateway::new(gateway_config.clone(), Arc::new(AutoApprove));
    let network_id = gateway.network_id().await?;
    println!("  Network id: {}", network_id);

    // Deployment recorded for this network
    let artifact = ContractArtifact::load(&gateway_config.artifact_path)?;
    match artifact.deployment(network_id) {
        Ok(address) => println!("  Contract deployed at {}", address),
        Err(e) => {
            return Err(anyhow::anyhow!(
                "{} (artifact lists networks: {:?})",
                e,
                artifact.network_ids()
            ));
        }
    }

    // Signer + balance
    let key = gateway_config
        .private_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("WALLET_PRIVATE_KEY must be set"))?;
    let signer: PrivateKeySigner = key
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("WALLET_PRIVATE_KEY is not a valid key: {}", e))?;
    let provider = ProviderBuilder::new().on_http(gateway_config.rpc_url.parse()?);
    let balance = provider.get_balance(signer.address()).await?;
    println!("  Signer: {}", signer.address());
    println!("  Signer balance: {} ETH", format_ether(balance));
    if balance.is_zero() {
        eprintln!("  Warning: signer has no funds; uploads will fail.");
    }

    // Ledger service
    if skip_ledger {
        println!("  Ledger check skipped.");
    } else {
        LedgerClient::from_config(&ledger_config)?
            .health()
            .await
            .map_err(|e| anyhow::anyhow!("ledger service unreachable: {}", e))?;
        println!("  Ledger service healthy.");
    }

    println!("> Preflight OK.");
    Ok(())
}

// Responsible for all communication with the signing agent and the on-chain contract.

use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, FixedBytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::crypto::hashing::DocumentDigest;
use crate::domain::Session;
use crate::infra::config::GatewayConfig;
use crate::infra::error::GatewayError;
use crate::infra::ethereum::artifact::ContractArtifact;

// Contract bindings. Upload/verify semantics live entirely in the deployed contract.
sol! {
    #[sol(rpc)]
    interface IDocumentVerification {
        function uploadDocument(bytes32 documentHash) external;

        function verifyDocument(bytes32 documentHash) external view returns (bool);
    }
}

/// State-changing contract methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    UploadDocument(DocumentDigest),
}

/// Read-only contract methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMethod {
    VerifyDocument(DocumentDigest),
}

/// A mined state-changing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// 0x-prefixed transaction hash.
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

/// Bridge between the signing agent and the contract instance.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Requests account access and resolves the contract deployment for the current network.
    async fn connect(&self) -> Result<Session, GatewayError>;

    /// Submits a state-changing call and waits until it is mined.
    async fn submit_write(
        &self,
        session: &Session,
        method: WriteMethod,
        from: Address,
    ) -> Result<WriteReceipt, GatewayError>;

    /// Submits a read-only call.
    async fn submit_read(&self, session: &Session, method: ReadMethod) -> Result<bool, GatewayError>;
}

/// Asks the user whether an account may be used for this session.
pub trait AccountApproval: Send + Sync {
    fn approve(&self, account: &Address) -> bool;
}

/// Approves every request (scripted / non-interactive use).
pub struct AutoApprove;

impl AccountApproval for AutoApprove {
    fn approve(&self, _account: &Address) -> bool {
        true
    }
}

/// Interactive y/N prompt on the terminal.
pub struct TerminalApproval;

impl AccountApproval for TerminalApproval {
    fn approve(&self, account: &Address) -> bool {
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "Allow account {} to sign for this session? [y/N] ",
            account.to_checksum(None)
        );
        let _ = stderr.flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Maps a send failure to the gateway taxonomy.
pub fn classify_write_error(message: &str) -> GatewayError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("revert") {
        GatewayError::ContractRevert(message.to_string())
    } else if lower.contains("gas") {
        GatewayError::Gas(message.to_string())
    } else {
        GatewayError::Rpc(message.to_string())
    }
}

fn to_bytes32(digest: &DocumentDigest) -> FixedBytes<32> {
    FixedBytes::from(*digest.as_bytes())
}

/// EVM gateway backed by a local signing key and a JSON-RPC endpoint.
pub struct EthereumGateway {
    config: GatewayConfig,
    approval: Arc<dyn AccountApproval>,
}

impl EthereumGateway {
    pub fn new(config: GatewayConfig, approval: Arc<dyn AccountApproval>) -> Self {
        Self { config, approval }
    }

    fn signer(&self) -> Result<PrivateKeySigner, GatewayError> {
        let key = self.config.private_key.as_deref().ok_or(GatewayError::NoWallet)?;
        key.trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| GatewayError::InvalidSigner(e.to_string()))
    }

    fn rpc_url(&self) -> Result<reqwest::Url, GatewayError> {
        self.config
            .rpc_url
            .parse()
            .map_err(|e| GatewayError::Rpc(format!("Invalid RPC URL: {}", e)))
    }

    /// Applies the caller deadline to a remote call.
    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let limit: Duration = self.config.rpc_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| GatewayError::Timeout(limit))?
    }

    /// Chain id of the endpoint, checked against the configured target network.
    pub async fn network_id(&self) -> Result<u64, GatewayError> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);
        let network_id = self
            .with_deadline(async {
                provider
                    .get_chain_id()
                    .await
                    .map_err(|e| GatewayError::Rpc(e.to_string()))
            })
            .await?;

        if let Some(expected) = self.config.expected_chain_id {
            if expected != network_id {
                warn!(expected, actual = network_id, "connected to unexpected network");
                return Err(GatewayError::NetworkMismatch { network_id });
            }
        }
        Ok(network_id)
    }
}

#[async_trait]
impl ContractGateway for EthereumGateway {
    async fn connect(&self) -> Result<Session, GatewayError> {
        let signer = self.signer()?;
        let account = signer.address();

        let approval = self.approval.clone();
        let approved = tokio::task::spawn_blocking(move || approval.approve(&account))
            .await
            .unwrap_or(false);
        if !approved {
            return Err(GatewayError::UserRejected);
        }

        let network_id = self.network_id().await?;

        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);
        let balance_wei = self
            .with_deadline(async {
                provider
                    .get_balance(account)
                    .await
                    .map_err(|e| GatewayError::Rpc(e.to_string()))
            })
            .await?;

        let artifact = ContractArtifact::load(&self.config.artifact_path)?;
        let contract = artifact.deployment(network_id)?;

        info!(
            account = %account,
            network_id,
            contract = %contract,
            "wallet connected"
        );

        Ok(Session {
            account,
            balance_wei,
            network_id,
            contract,
        })
    }

    async fn submit_write(
        &self,
        session: &Session,
        method: WriteMethod,
        from: Address,
    ) -> Result<WriteReceipt, GatewayError> {
        let signer = self.signer()?;
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_http(self.rpc_url()?);
        let contract = IDocumentVerification::new(session.contract, &provider);

        let WriteMethod::UploadDocument(digest) = method;
        let call = contract
            .uploadDocument(to_bytes32(&digest))
            .from(from)
            .gas(self.config.gas_limit);

        let receipt = self
            .with_deadline(async {
                let pending = call
                    .send()
                    .await
                    .map_err(|e| classify_write_error(&e.to_string()))?;
                debug!("transaction sent: {:?}", pending.tx_hash());
                pending
                    .get_receipt()
                    .await
                    .map_err(|e| GatewayError::Rpc(format!("Failed to get receipt: {}", e)))
            })
            .await?;

        let transaction_hash = receipt.transaction_hash.to_string();
        if !receipt.status() {
            return Err(GatewayError::ContractRevert(format!(
                "transaction {} reverted (document may already be recorded)",
                transaction_hash
            )));
        }

        info!(
            tx = %transaction_hash,
            block = receipt.block_number.unwrap_or(0),
            gas_used = %receipt.gas_used,
            "uploadDocument mined"
        );

        Ok(WriteReceipt {
            transaction_hash,
            block_number: receipt.block_number,
        })
    }

    async fn submit_read(&self, session: &Session, method: ReadMethod) -> Result<bool, GatewayError> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);
        let contract = IDocumentVerification::new(session.contract, &provider);

        let ReadMethod::VerifyDocument(digest) = method;
        let result = self
            .with_deadline(async {
                contract
                    .verifyDocument(to_bytes32(&digest))
                    .call()
                    .await
                    .map_err(|e| GatewayError::ContractCall(e.to_string()))
            })
            .await?;

        Ok(result._0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_send_failures() {
        assert!(matches!(
            classify_write_error("server returned an error response: execution reverted: Document already exists"),
            GatewayError::ContractRevert(_)
        ));
        assert!(matches!(
            classify_write_error("intrinsic gas too low"),
            GatewayError::Gas(_)
        ));
        assert!(matches!(
            classify_write_error("insufficient funds for gas * price + value"),
            GatewayError::Gas(_)
        ));
        assert!(matches!(
            classify_write_error("connection refused"),
            GatewayError::Rpc(_)
        ));
    }

    #[tokio::test]
    async fn connect_without_key_is_no_wallet() {
        let gateway = EthereumGateway::new(
            GatewayConfig {
                rpc_url: "http://127.0.0.1:1".to_string(),
                expected_chain_id: None,
                artifact_path: "missing.json".into(),
                private_key: None,
                gas_limit: 300_000,
                rpc_timeout: Duration::from_secs(1),
            },
            Arc::new(AutoApprove),
        );
        assert!(matches!(gateway.connect().await, Err(GatewayError::NoWallet)));
    }

    #[tokio::test]
    async fn declined_approval_is_user_rejected() {
        struct Decline;
        impl AccountApproval for Decline {
            fn approve(&self, _account: &Address) -> bool {
                false
            }
        }

        let gateway = EthereumGateway::new(
            GatewayConfig {
                rpc_url: "http://127.0.0.1:1".to_string(),
                expected_chain_id: None,
                artifact_path: "missing.json".into(),
                // Well-known anvil/hardhat development key #0.
                private_key: Some(
                    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
                ),
                gas_limit: 300_000,
                rpc_timeout: Duration::from_secs(1),
            },
            Arc::new(Decline),
        );
        assert!(matches!(gateway.connect().await, Err(GatewayError::UserRejected)));
    }

    #[test]
    fn bad_key_is_invalid_signer() {
        let gateway = EthereumGateway::new(
            GatewayConfig {
                rpc_url: "http://127.0.0.1:1".to_string(),
                expected_chain_id: None,
                artifact_path: "missing.json".into(),
                private_key: Some("not-a-key".to_string()),
                gas_limit: 300_000,
                rpc_timeout: Duration::from_secs(1),
            },
            Arc::new(AutoApprove),
        );
        assert!(matches!(gateway.signer(), Err(GatewayError::InvalidSigner(_))));
    }
}

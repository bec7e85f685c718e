//! Error types for each layer of the document ledger.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while turning a file into a digest.
#[derive(Error, Debug)]
pub enum HashError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The digest algorithm rejected the input.
    #[error("digest error: {0}")]
    Digest(String),
}

/// Errors raised by the wallet / contract gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No signing agent is configured.
    #[error("no wallet detected: set WALLET_PRIVATE_KEY to enable a signing agent")]
    NoWallet,

    /// The configured signing key could not be parsed.
    #[error("invalid signing key: {0}")]
    InvalidSigner(String),

    /// The user declined the account access request.
    #[error("user rejected the account access request")]
    UserRejected,

    /// The contract artifact has no deployment for the connected network.
    #[error("smart contract not deployed on the detected network ({network_id})")]
    NetworkMismatch { network_id: u64 },

    /// The contract artifact could not be loaded or parsed.
    #[error("failed to load contract artifact: {0}")]
    Artifact(String),

    /// The contract rejected the state-changing call.
    #[error("transaction reverted: {0}")]
    ContractRevert(String),

    /// The transaction ran out of gas or could not be priced.
    #[error("gas error: {0}")]
    Gas(String),

    /// A read-only call failed.
    #[error("contract call failed: {0}")]
    ContractCall(String),

    /// Transport or node failure talking to the RPC endpoint.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The call did not complete within the caller's deadline.
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors from the persistent event store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// HTTP failures between the ledger client and the ledger service.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("dispatch queue {0}")]
    Queue(&'static str),
}

/// Configuration could not be read from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Why an upload or verify action did not complete.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Please connect your wallet first.")]
    NotConnected,

    #[error("Please choose a file to {0}")]
    NoFileSelected(&'static str),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ActionError {
    /// Precondition failures are reported to the user but never logged to the ledger.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ActionError::NotConnected | ActionError::NoFileSelected(_))
    }
}

//! Centralized configuration (environment variables + defaults).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::infra::error::ConfigError;

fn var(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    var(name).ok_or(ConfigError::Missing(name))
}

fn parsed_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(v) => v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Postgres connection options.
///
/// `DATABASE_URL` wins; otherwise the options are built from `DB_HOST`, `DB_PORT`,
/// `DB_USER`, `DB_PASSWORD` and `DB_NAME`.
pub fn database_options() -> Result<PgConnectOptions, ConfigError> {
    if let Some(url) = var("DATABASE_URL") {
        return PgConnectOptions::from_str(&url).map_err(|e| ConfigError::Invalid {
            name: "DATABASE_URL",
            reason: e.to_string(),
        });
    }
    Ok(compose_database_options(
        &var("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
        parsed_or("DB_PORT", 5432)?,
        &var("DB_USER").unwrap_or_else(|| "postgres".to_string()),
        var("DB_PASSWORD").as_deref(),
        &var("DB_NAME").unwrap_or_else(|| "job_verification".to_string()),
    ))
}

/// Credentials are passed as-is; no URL escaping is involved.
pub fn compose_database_options(
    host: &str,
    port: u16,
    user: &str,
    password: Option<&str>,
    database: &str,
) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(user)
        .database(database);
    match password {
        Some(password) => options.password(password),
        None => options,
    }
}

/// Upper bound on concurrently checked-out store connections.
pub fn db_pool_size() -> Result<u32, ConfigError> {
    Ok(parsed_or("DB_POOL_SIZE", 10u32)?.max(1))
}

/// How long a request waits in the pool queue before failing.
pub fn db_acquire_timeout() -> Result<Duration, ConfigError> {
    parsed_or("DB_ACQUIRE_TIMEOUT_SECS", 30u64).map(Duration::from_secs)
}

/// Which backing store the ledger service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

pub fn ledger_store() -> Result<StoreKind, ConfigError> {
    match var("LEDGER_STORE").as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("postgres") => Ok(StoreKind::Postgres),
        Some("memory") => Ok(StoreKind::Memory),
        Some(other) => Err(ConfigError::Invalid {
            name: "LEDGER_STORE",
            reason: format!("expected 'postgres' or 'memory', got '{}'", other),
        }),
    }
}

pub fn ledger_listen_addr() -> Result<SocketAddr, ConfigError> {
    parsed_or("LEDGER_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 5000)))
}

/// Base URL of the ledger service as seen from the client.
pub fn ledger_url() -> String {
    var("LEDGER_URL")
        .unwrap_or_else(|| "http://localhost:5000".to_string())
        .trim_end_matches('/')
        .to_string()
}

pub fn ledger_timeout() -> Result<Duration, ConfigError> {
    parsed_or("LEDGER_TIMEOUT_SECS", 10u64).map(Duration::from_secs)
}

pub fn ledger_queue_capacity() -> Result<usize, ConfigError> {
    Ok(parsed_or("LEDGER_QUEUE_CAPACITY", 64usize)?.max(1))
}

pub fn ledger_refresh_interval() -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(parsed_or("LEDGER_REFRESH_SECS", 10u64)?.max(1)))
}

/// Ethereum JSON-RPC endpoint (required for wallet commands).
pub fn eth_rpc_url() -> Result<String, ConfigError> {
    required("ETH_RPC_URL")
}

/// Optional pin on the network the client is allowed to talk to.
pub fn eth_expected_chain_id() -> Result<Option<u64>, ConfigError> {
    match var("ETH_EXPECTED_CHAIN_ID") {
        Some(v) => v.trim().parse::<u64>().map(Some).map_err(|e| ConfigError::Invalid {
            name: "ETH_EXPECTED_CHAIN_ID",
            reason: e.to_string(),
        }),
        None => Ok(None),
    }
}

/// Published contract artifact (Truffle build output).
pub fn contract_artifact_path() -> PathBuf {
    var("CONTRACT_ARTIFACT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("build/contracts/DocumentVerification.json"))
}

/// Hex-encoded signing key. Absent means no signing agent is present.
pub fn wallet_private_key() -> Option<String> {
    var("WALLET_PRIVATE_KEY")
}

pub fn upload_gas_limit() -> Result<u64, ConfigError> {
    parsed_or("UPLOAD_GAS_LIMIT", 300_000u64)
}

pub fn rpc_timeout() -> Result<Duration, ConfigError> {
    parsed_or("RPC_TIMEOUT_SECS", 120u64).map(Duration::from_secs)
}

/// Settings for the ledger HTTP service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub store: StoreKind,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: ledger_listen_addr()?,
            store: ledger_store()?,
            pool_size: db_pool_size()?,
            acquire_timeout: db_acquire_timeout()?,
        })
    }
}

/// Settings for the ledger client and its dispatch queue.
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub queue_capacity: usize,
    pub refresh_interval: Duration,
}

impl LedgerClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: ledger_url(),
            timeout: ledger_timeout()?,
            queue_capacity: ledger_queue_capacity()?,
            refresh_interval: ledger_refresh_interval()?,
        })
    }
}

/// Settings for the wallet / contract gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub rpc_url: String,
    pub expected_chain_id: Option<u64>,
    pub artifact_path: PathBuf,
    pub private_key: Option<String>,
    pub gas_limit: u64,
    pub rpc_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            rpc_url: eth_rpc_url()?,
            expected_chain_id: eth_expected_chain_id()?,
            artifact_path: contract_artifact_path(),
            private_key: wallet_private_key(),
            gas_limit: upload_gas_limit()?,
            rpc_timeout: rpc_timeout()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_characters_in_credentials_keep_the_host() {
        let options = compose_database_options(
            "db.internal",
            6543,
            "ledger@ops",
            Some("a/b?c#d@e"),
            "job_verification",
        );
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "ledger@ops");
        assert_eq!(options.get_database(), Some("job_verification"));
    }
}

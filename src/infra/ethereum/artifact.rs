//! Published contract artifact (Truffle build output) and deployment lookup.

use alloy::primitives::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::infra::error::GatewayError;

#[derive(Debug, Clone, Deserialize)]
pub struct DeployedNetwork {
    pub address: String,
}

/// The subset of a Truffle artifact needed to locate a deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    #[serde(default, rename = "contractName")]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub networks: HashMap<String, DeployedNetwork>,
}

impl ContractArtifact {
    pub fn from_json(raw: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(raw).map_err(|e| GatewayError::Artifact(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Artifact(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    /// Deployment address recorded for `network_id`.
    pub fn deployment(&self, network_id: u64) -> Result<Address, GatewayError> {
        let network = self
            .networks
            .get(&network_id.to_string())
            .ok_or(GatewayError::NetworkMismatch { network_id })?;
        Address::from_str(network.address.trim()).map_err(|e| {
            GatewayError::Artifact(format!(
                "bad address for network {}: {}",
                network_id, e
            ))
        })
    }

    pub fn network_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

//! Connected wallet session.

use alloy::primitives::{Address, U256};

/// Result of a successful `connect`: the approved account and the contract it will talk to.
///
/// A session is only valid for the network it was created on; a network change means
/// a new `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: Address,
    pub balance_wei: U256,
    pub network_id: u64,
    pub contract: Address,
}

impl Session {
    /// Account formatted the way it is logged to the ledger (EIP-55 checksum).
    pub fn account_hex(&self) -> String {
        self.account.to_checksum(None)
    }

    pub fn balance_ether(&self) -> String {
        alloy::primitives::utils::format_ether(self.balance_wei)
    }

    /// "Connected: 0x… | Balance: 1.5 ETH"
    pub fn wallet_info(&self) -> String {
        format!(
            "Connected: {} | Balance: {} ETH",
            self.account_hex(),
            self.balance_ether()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_info_shows_checksum_account_and_balance() {
        let session = Session {
            account: "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".parse().unwrap(),
            balance_wei: U256::from(1_500_000_000_000_000_000u128),
            network_id: 5777,
            contract: Address::ZERO,
        };
        let info = session.wallet_info();
        assert!(info.starts_with("Connected: 0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1 | Balance: 1.5"));
        assert!(info.ends_with(" ETH"));
    }
}

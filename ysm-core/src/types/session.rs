//! Session: the client's belief about which account and network the wallet represents.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use super::ChainId;
use crate::error::{NameServiceError, Result};

/// Parses an account address as returned by a wallet.
///
/// Wallets may return lowercase or checksummed addresses; both parse to the
/// same 20 bytes, so comparisons on [`Address`] are case-insensitive.
pub fn parse_address(s: &str) -> Result<Address> {
    s.trim()
        .parse::<Address>()
        .map_err(|_| NameServiceError::InvalidAddress(s.to_string()))
}

/// Shortened display form: `0x1234...abcd`.
pub fn short_address(address: &Address) -> String {
    let full = format!("{:#x}", address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Connected account and active network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Connected account, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Active network reported by the wallet, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
}

impl Session {
    /// Whether an account is connected.
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Whether the wallet is on the supported target network.
    pub fn on_target_network(&self) -> bool {
        self.chain_id.is_some_and(ChainId::is_target)
    }

    /// Connected and on the target network: the precondition for directory reads.
    pub fn is_ready(&self) -> bool {
        self.is_connected() && self.on_target_network()
    }

    /// Whether `owner` is the connected account.
    pub fn owns(&self, owner: &Address) -> bool {
        self.address.as_ref() == Some(owner)
    }

    /// Header line: network name and shortened wallet.
    pub fn describe(&self) -> String {
        let network = match self.chain_id {
            Some(id) => id.network_name().map(str::to_string).unwrap_or_else(|| id.to_hex()),
            None => "Unknown network".into(),
        };
        match &self.address {
            Some(address) => format!("{} | Wallet: {}", network, short_address(address)),
            None => format!("{} | Not connected", network),
        }
    }
}

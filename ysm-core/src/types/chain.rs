//! Chain identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{
    BLOCK_EXPLORER_URL, KNOWN_NETWORKS, NATIVE_CURRENCY_DECIMALS, NATIVE_CURRENCY_NAME,
    NATIVE_CURRENCY_SYMBOL, TARGET_CHAIN_ID, TARGET_CHAIN_NAME, TARGET_RPC_URL,
};
use crate::error::{NameServiceError, Result};

/// An EVM chain id.
///
/// Wallets exchange chain ids as `0x`-prefixed hex quantities
/// (`"0x13881"`), so that is the serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    /// The only network the client operates against.
    pub const TARGET: ChainId = ChainId(TARGET_CHAIN_ID);

    /// Parses a hex quantity (`0x13881`) or a decimal string (`80001`).
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| NameServiceError::InvalidChainId(s.to_string()))
    }

    /// Hex quantity form, as used on the wire.
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }

    /// Whether this is the supported target network.
    pub fn is_target(self) -> bool {
        self == Self::TARGET
    }

    /// Display name for well-known chains.
    pub fn network_name(self) -> Option<&'static str> {
        KNOWN_NETWORKS
            .iter()
            .find(|(id, _)| *id == self.0)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network_name() {
            Some(name) => write!(f, "{} ({})", name, self.to_hex()),
            None => write!(f, "{}", self.to_hex()),
        }
    }
}

impl FromStr for ChainId {
    type Err = NameServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ChainId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Native currency metadata for `wallet_addEthereumChain`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Currency name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

/// Chain definition sent to the wallet when it does not know the target chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDefinition {
    /// Chain id (hex on the wire)
    pub chain_id: ChainId,
    /// Display name
    pub chain_name: String,
    /// RPC endpoints
    pub rpc_urls: Vec<String>,
    /// Native currency
    pub native_currency: NativeCurrency,
    /// Block explorers
    pub block_explorer_urls: Vec<String>,
}

impl ChainDefinition {
    /// Definition of the target network.
    pub fn target() -> Self {
        Self {
            chain_id: ChainId::TARGET,
            chain_name: TARGET_CHAIN_NAME.into(),
            rpc_urls: vec![TARGET_RPC_URL.into()],
            native_currency: NativeCurrency {
                name: NATIVE_CURRENCY_NAME.into(),
                symbol: NATIVE_CURRENCY_SYMBOL.into(),
                decimals: NATIVE_CURRENCY_DECIMALS,
            },
            block_explorer_urls: vec![BLOCK_EXPLORER_URL.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_and_decimal() {
        assert_eq!(ChainId::parse("0x13881").unwrap(), ChainId(80_001));
        assert_eq!(ChainId::parse("80001").unwrap(), ChainId(80_001));
        assert_eq!(ChainId::parse("0X89").unwrap(), ChainId(137));
        assert!(ChainId::parse("0xzz").is_err());
        assert!(ChainId::parse("").is_err());
    }

    #[test]
    fn test_target() {
        assert!(ChainId::TARGET.is_target());
        assert!(!ChainId(1).is_target());
        assert_eq!(ChainId::TARGET.to_hex(), "0x13881");
        assert_eq!(ChainId::TARGET.network_name(), Some("Polygon Mumbai Testnet"));
        assert_eq!(ChainId(999_999).network_name(), None);
    }

    #[test]
    fn test_chain_definition_wire_format() {
        let json = serde_json::to_value(ChainDefinition::target()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chainId": "0x13881",
                "chainName": "Polygon Mumbai Testnet",
                "rpcUrls": ["https://rpc-mumbai.maticvigil.com/"],
                "nativeCurrency": {
                    "name": "Mumbai Matic",
                    "symbol": "MATIC",
                    "decimals": 18
                },
                "blockExplorerUrls": ["https://mumbai.polygonscan.com/"]
            })
        );
    }
}

//! Constants for the YSM name service client.
//!
//! The contract address and the target network are compiled in: the client
//! talks to exactly one deployment on exactly one chain.

use alloy::primitives::{address, Address};

// ═══════════════════════════════════════════════════════════════════════════════
// NAME SERVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Top-level domain served by the contract.
pub const TLD: &str = "ysm";

/// Deployed name-service contract.
pub const CONTRACT_ADDRESS: Address = address!("726a35006e7c763004a2557ff581e81e39fab77f");

/// Shortest name the client will try to mint.
/// Shorter names are rejected locally so no paid transaction is wasted.
pub const MIN_NAME_LENGTH: usize = 3;

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET NETWORK (Polygon Mumbai)
// ═══════════════════════════════════════════════════════════════════════════════

/// Chain id of the only supported network.
pub const TARGET_CHAIN_ID: u64 = 80_001;

/// Human name of the target network, as wallets display it.
pub const TARGET_CHAIN_NAME: &str = "Polygon Mumbai Testnet";

/// Public RPC endpoint advertised when asking the wallet to add the chain.
pub const TARGET_RPC_URL: &str = "https://rpc-mumbai.maticvigil.com/";

/// Native currency name on the target network.
pub const NATIVE_CURRENCY_NAME: &str = "Mumbai Matic";

/// Native currency ticker on the target network.
pub const NATIVE_CURRENCY_SYMBOL: &str = "MATIC";

/// Native currency decimals on the target network.
pub const NATIVE_CURRENCY_DECIMALS: u8 = 18;

/// Block explorer for the target network.
pub const BLOCK_EXPLORER_URL: &str = "https://mumbai.polygonscan.com/";

/// Asset explorer base for minted names (`<base>/<contract>/<token id>`).
pub const ASSET_EXPLORER_URL: &str = "https://testnets.opensea.io/assets/mumbai";

/// Chain ids wallets commonly report, with their display names.
pub const KNOWN_NETWORKS: &[(u64, &str)] = &[
    (1, "Mainnet"),
    (3, "Ropsten"),
    (4, "Rinkeby"),
    (5, "Goerli"),
    (42, "Kovan"),
    (56, "BSC Mainnet"),
    (97, "BSC Testnet"),
    (137, "Polygon Mainnet"),
    (43_114, "AVAX Mainnet"),
    (TARGET_CHAIN_ID, TARGET_CHAIN_NAME),
];

// ═══════════════════════════════════════════════════════════════════════════════
// EIP-1193 PROVIDER ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

/// The user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// The requested method or account has not been authorized by the user.
pub const UNAUTHORIZED: i64 = 4100;

/// The provider does not support the requested method.
pub const UNSUPPORTED_METHOD: i64 = 4200;

/// The requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

// ═══════════════════════════════════════════════════════════════════════════════
// CLIENT DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default wallet provider endpoint (local desktop wallet).
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

/// Delay before re-reading the directory after a mint, so the indexing node catches up.
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 2_000;

/// Interval between transaction receipt polls.
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Give up waiting for a receipt after this long.
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 300;

/// Interval between chain id polls when watching for network changes.
pub const DEFAULT_CHAIN_POLL_MS: u64 = 1_500;

/// Per-request timeout for wallet RPC calls.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_address_matches_deployment() {
        let parsed: Address = "0x726A35006E7C763004a2557FF581e81E39faB77F".parse().unwrap();
        assert_eq!(CONTRACT_ADDRESS, parsed);
    }

    #[test]
    fn test_target_chain_is_mumbai() {
        assert_eq!(format!("{:#x}", TARGET_CHAIN_ID), "0x13881");
    }

    #[test]
    fn test_known_networks_unique() {
        for (i, (a, _)) in KNOWN_NETWORKS.iter().enumerate() {
            for (j, (b, _)) in KNOWN_NETWORKS.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Chain ids must be unique");
                }
            }
        }
    }
}

//! Seams to the outside world.
//!
//! The orchestrator only ever talks to a wallet through [`WalletProvider`] and
//! to the user through [`Notifier`], so both can be swapped for scripted
//! implementations in tests.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::types::ChainId;

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET PROVIDER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// An EIP-1193 wallet provider.
///
/// Holds the user's keys and brokers account, network and transaction
/// requests. Every call is a `request(method, params)` round trip; failures
/// carry EIP-1193 error codes (see [`crate::ProviderRpcError`]).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Sends a JSON-RPC request through the wallet.
    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value>;

    /// Subscribes to `chainChanged` notifications.
    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFIER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Blocking user notifications ("alerts").
///
/// Used for missing wallets, local validation failures and failed
/// transactions. Everything else is only logged.
pub trait Notifier: Send + Sync {
    /// Shows `message` to the user.
    fn alert(&self, message: &str);
}

/// Notifier that only logs; for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!(alert = message, "User notification");
    }
}

//! Client configuration: wallet endpoint and timing knobs.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ysm_contract::ContractConfig;
use ysm_core::constants::{
    CONTRACT_ADDRESS, DEFAULT_CHAIN_POLL_MS, DEFAULT_RECEIPT_POLL_MS, DEFAULT_RECEIPT_TIMEOUT_SECS,
    DEFAULT_REFRESH_DELAY_MS, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_WALLET_URL,
};
use ysm_core::error::{NameServiceError, Result};
use ysm_wallet::WalletConfig;

/// Orchestrator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Wallet provider JSON-RPC endpoint
    pub wallet_url: String,
    /// Delay before the post-mint directory refresh, in milliseconds
    pub refresh_delay_ms: u64,
    /// Receipt poll interval, in milliseconds
    pub receipt_poll_ms: u64,
    /// Receipt wait timeout, in seconds
    pub receipt_timeout_secs: u64,
    /// Chain-change poll interval, in milliseconds
    pub chain_poll_ms: u64,
    /// Wallet request timeout, in seconds
    pub rpc_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wallet_url: DEFAULT_WALLET_URL.into(),
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            chain_poll_ms: DEFAULT_CHAIN_POLL_MS,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Reads `YSM_*` variables, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            wallet_url: lookup("YSM_WALLET_URL").unwrap_or(defaults.wallet_url),
            refresh_delay_ms: parse_var(&lookup, "YSM_REFRESH_DELAY_MS", defaults.refresh_delay_ms)?,
            receipt_poll_ms: parse_var(&lookup, "YSM_RECEIPT_POLL_MS", defaults.receipt_poll_ms)?,
            receipt_timeout_secs: parse_var(
                &lookup,
                "YSM_RECEIPT_TIMEOUT_SECS",
                defaults.receipt_timeout_secs,
            )?,
            chain_poll_ms: parse_var(&lookup, "YSM_CHAIN_POLL_MS", defaults.chain_poll_ms)?,
            rpc_timeout_secs: parse_var(&lookup, "YSM_RPC_TIMEOUT_SECS", defaults.rpc_timeout_secs)?,
        })
    }

    /// Overrides the wallet endpoint.
    pub fn with_wallet_url(mut self, url: impl Into<String>) -> Self {
        self.wallet_url = url.into();
        self
    }

    /// Delay before the post-mint refresh.
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    /// Settings for the HTTP wallet provider.
    pub fn wallet_config(&self) -> WalletConfig {
        WalletConfig {
            url: self.wallet_url.clone(),
            timeout_seconds: self.rpc_timeout_secs,
            chain_poll_ms: self.chain_poll_ms,
        }
    }

    /// Settings for the contract client.
    pub fn contract_config(&self) -> ContractConfig {
        ContractConfig {
            address: CONTRACT_ADDRESS,
            receipt_poll_ms: self.receipt_poll_ms,
            receipt_timeout_seconds: self.receipt_timeout_secs,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| NameServiceError::ConfigError(format!("{}={}: {}", key, raw, e))),
        None => Ok(default),
    }
}

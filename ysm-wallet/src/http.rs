//! Wallet provider reached over HTTP JSON-RPC.
//!
//! Desktop wallets and development nodes expose the same EIP-1193 method
//! surface a browser extension injects, only over HTTP. Network changes are
//! not pushed over HTTP, so a background task polls `eth_chainId` and turns
//! changes into `chainChanged` notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use ysm_core::constants::{DEFAULT_CHAIN_POLL_MS, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_WALLET_URL};
use ysm_core::error::{NameServiceError, ProviderRpcError, Result};
use ysm_core::traits::WalletProvider;
use ysm_core::types::ChainId;

/// Capacity of the `chainChanged` channel; slow listeners only need the latest.
const CHAIN_CHANNEL_CAPACITY: usize = 16;

/// Wallet endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of the wallet
    pub url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// How often to poll the active chain, in milliseconds
    pub chain_poll_ms: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WALLET_URL.into(),
            timeout_seconds: DEFAULT_RPC_TIMEOUT_SECS,
            chain_poll_ms: DEFAULT_CHAIN_POLL_MS,
        }
    }
}

impl WalletConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// EIP-1193 provider over HTTP.
pub struct HttpWalletProvider {
    config: WalletConfig,
    http_client: reqwest::Client,
    next_id: AtomicU64,
    chain_tx: broadcast::Sender<ChainId>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl HttpWalletProvider {
    /// Creates a provider for the configured endpoint.
    ///
    /// Does not contact the wallet; see [`HttpWalletProvider::detect`].
    pub fn with_config(config: WalletConfig) -> Result<Self> {
        url::Url::parse(&config.url)
            .map_err(|e| NameServiceError::ConfigError(format!("wallet url {}: {}", config.url, e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NameServiceError::ConfigError(e.to_string()))?;

        let (chain_tx, _) = broadcast::channel(CHAIN_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            http_client,
            next_id: AtomicU64::new(1),
            chain_tx,
            watcher: Mutex::new(None),
        })
    }

    /// Probes the endpoint and returns a running provider if a wallet answers.
    ///
    /// `Ok(None)` means nothing is listening: the "no wallet installed" case.
    /// The returned provider already watches for chain changes.
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn detect(config: WalletConfig) -> Result<Option<Arc<Self>>> {
        let provider = Arc::new(Self::with_config(config)?);

        match provider.request("eth_chainId", serde_json::json!([])).await {
            Ok(value) => {
                let chain = value
                    .as_str()
                    .map(ChainId::parse)
                    .transpose()?
                    .ok_or_else(|| NameServiceError::RpcError("eth_chainId: not a string".into()))?;
                info!(%chain, "Wallet provider detected");
                provider.start_chain_watcher(chain);
                Ok(Some(provider))
            }
            Err(NameServiceError::HttpError(e)) | Err(NameServiceError::ConnectionTimeout(e)) => {
                debug!(error = %e, "No wallet provider at endpoint");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Starts polling `eth_chainId`, emitting a notification on every change.
    ///
    /// Replaces any watcher already running.
    pub fn start_chain_watcher(self: &Arc<Self>, initial: ChainId) {
        let weak = Arc::downgrade(self);
        let interval = Duration::from_millis(self.config.chain_poll_ms.max(1));
        let handle = tokio::spawn(watch_chain(weak, initial, interval));

        if let Some(previous) = self.watcher.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stops the chain watcher, if running.
    pub fn stop_chain_watcher(&self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.abort();
        }
    }

    fn map_transport_error(e: reqwest::Error) -> NameServiceError {
        if e.is_timeout() {
            NameServiceError::ConnectionTimeout(e.to_string())
        } else {
            NameServiceError::HttpError(e.to_string())
        }
    }
}

impl Drop for HttpWalletProvider {
    fn drop(&mut self) {
        self.stop_chain_watcher();
    }
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        debug!(method, id, "Wallet request");

        let response = self
            .http_client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let json: serde_json::Value = response.json().await.map_err(Self::map_transport_error)?;

        if let Some(error) = json.get("error") {
            let error: ProviderRpcError = serde_json::from_value(error.clone())
                .map_err(|e| NameServiceError::RpcError(format!("{}: bad error object: {}", method, e)))?;
            debug!(method, code = error.code, message = %error.message, "Wallet error");
            return Err(error.into());
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| NameServiceError::RpcError(format!("{}: response has no result", method)))
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId> {
        self.chain_tx.subscribe()
    }
}

async fn watch_chain(provider: Weak<HttpWalletProvider>, mut current: ChainId, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(live) = provider.upgrade() else {
            return;
        };

        let observed = match live.request("eth_chainId", serde_json::json!([])).await {
            Ok(value) => value.as_str().and_then(|s| ChainId::parse(s).ok()),
            Err(e) => {
                warn!(error = %e, "Chain poll failed");
                None
            }
        };

        if let Some(chain) = observed {
            if chain != current {
                info!(from = %current, to = %chain, "Chain changed");
                current = chain;
                // No receivers is fine: nobody has registered a listener yet.
                let _ = live.chain_tx.send(chain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result
        }))
    }

    fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        }))
    }

    #[test]
    fn test_rejects_invalid_url() {
        let result = HttpWalletProvider::with_config(WalletConfig::new("not a url"));
        assert!(matches!(result, Err(NameServiceError::ConfigError(_))));
    }

    #[test]
    fn test_config_default() {
        let config = WalletConfig::default();
        assert_eq!(config.url, DEFAULT_WALLET_URL);
        assert_eq!(config.timeout_seconds, DEFAULT_RPC_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_request_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "method": "eth_accounts" })))
            .respond_with(rpc_result(serde_json::json!(["0xabc0000000000000000000000000000000000def"])))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpWalletProvider::with_config(WalletConfig::new(server.uri())).unwrap();
        let result = provider.request("eth_accounts", serde_json::json!([])).await.unwrap();

        assert_eq!(result[0], "0xabc0000000000000000000000000000000000def");
    }

    #[tokio::test]
    async fn test_request_maps_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_error(4902, "Unrecognized chain ID"))
            .mount(&server)
            .await;

        let provider = HttpWalletProvider::with_config(WalletConfig::new(server.uri())).unwrap();
        let err = provider
            .request("wallet_switchEthereumChain", serde_json::json!([{ "chainId": "0x13881" }]))
            .await
            .unwrap_err();

        assert!(err.is_unrecognized_chain());
    }

    #[tokio::test]
    async fn test_detect_without_wallet() {
        // Nothing listens on port 9 (discard) in the test environment.
        let found = HttpWalletProvider::detect(WalletConfig::new("http://127.0.0.1:9"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_detect_with_wallet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "method": "eth_chainId" })))
            .respond_with(rpc_result(serde_json::json!("0x13881")))
            .mount(&server)
            .await;

        let found = HttpWalletProvider::detect(WalletConfig::new(server.uri()))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_chain_watcher_emits_changes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "method": "eth_chainId" })))
            .respond_with(rpc_result(serde_json::json!("0x1")))
            .mount(&server)
            .await;

        let mut config = WalletConfig::new(server.uri());
        config.chain_poll_ms = 10;
        let provider = Arc::new(HttpWalletProvider::with_config(config).unwrap());
        let mut changes = provider.subscribe_chain_changed();

        provider.start_chain_watcher(ChainId::TARGET);

        let changed = tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(changed, ChainId(1));
    }
}

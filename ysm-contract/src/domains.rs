//! Client for the name-service contract.
//!
//! Reads go through `eth_call`; writes are handed to the wallet with
//! `eth_sendTransaction` and return a [`PendingTransaction`] whose receipt can
//! be awaited.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ysm_core::constants::{
    BLOCK_EXPLORER_URL, CONTRACT_ADDRESS, DEFAULT_RECEIPT_POLL_MS, DEFAULT_RECEIPT_TIMEOUT_SECS,
};
use ysm_core::error::{NameServiceError, Result};
use ysm_core::traits::WalletProvider;
use ysm_wallet::{TransactionReceipt, TransactionRequest, WalletExt};

use crate::abi::IDomains;

/// Block explorer page for a transaction.
pub fn tx_explorer_url(hash: &TxHash) -> String {
    format!("{}tx/{:#x}", BLOCK_EXPLORER_URL, hash)
}

fn decode_error(call: &str, e: alloy::sol_types::Error) -> NameServiceError {
    NameServiceError::AbiError(format!("{}: {}", call, e))
}

/// Contract client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Deployed contract
    pub address: Address,
    /// Interval between receipt polls, in milliseconds
    pub receipt_poll_ms: u64,
    /// Give up on a receipt after this many seconds
    pub receipt_timeout_seconds: u64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: CONTRACT_ADDRESS,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            receipt_timeout_seconds: DEFAULT_RECEIPT_TIMEOUT_SECS,
        }
    }
}

/// The `.ysm` name-service contract, reached through a wallet.
#[derive(Clone)]
pub struct DomainsContract {
    wallet: Arc<dyn WalletProvider>,
    config: ContractConfig,
}

impl DomainsContract {
    /// Creates a client with custom configuration.
    pub fn with_config(wallet: Arc<dyn WalletProvider>, config: ContractConfig) -> Self {
        Self { wallet, config }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READS
    // ═══════════════════════════════════════════════════════════════════════════

    /// All registered names, in registration order.
    #[instrument(skip(self))]
    pub async fn get_all_names(&self) -> Result<Vec<String>> {
        let data = IDomains::getAllNamesCall {}.abi_encode();
        let ret = self.wallet.call(self.config.address, &data).await?;
        let names = IDomains::getAllNamesCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error("getAllNames", e))?
            ._0;
        debug!(count = names.len(), "Got all names");
        Ok(names)
    }

    /// Text record of `name` (empty if never set).
    #[instrument(skip(self))]
    pub async fn record(&self, name: &str) -> Result<String> {
        let data = IDomains::recordsCall { name: name.to_string() }.abi_encode();
        let ret = self.wallet.call(self.config.address, &data).await?;
        Ok(IDomains::recordsCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error("records", e))?
            ._0)
    }

    /// Owner of `name` (zero address if unregistered).
    #[instrument(skip(self))]
    pub async fn owner(&self, name: &str) -> Result<Address> {
        let data = IDomains::domainsCall { name: name.to_string() }.abi_encode();
        let ret = self.wallet.call(self.config.address, &data).await?;
        Ok(IDomains::domainsCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error("domains", e))?
            ._0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WRITES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Submits `register(name)` paying `value` wei.
    #[instrument(skip(self), fields(value = %value))]
    pub async fn register(&self, from: Address, name: &str, value: U256) -> Result<PendingTransaction> {
        let data = IDomains::registerCall { name: name.to_string() }.abi_encode();
        self.submit(from, data, value).await
    }

    /// Submits `setRecord(name, record)`.
    #[instrument(skip(self))]
    pub async fn set_record(&self, from: Address, name: &str, record: &str) -> Result<PendingTransaction> {
        let data = IDomains::setRecordCall {
            name: name.to_string(),
            record: record.to_string(),
        }
        .abi_encode();
        self.submit(from, data, U256::ZERO).await
    }

    async fn submit(&self, from: Address, data: Vec<u8>, value: U256) -> Result<PendingTransaction> {
        let tx = TransactionRequest {
            from,
            to: self.config.address,
            data,
            value,
        };
        let hash = self.wallet.send_transaction(&tx).await?;
        Ok(PendingTransaction {
            hash,
            wallet: self.wallet.clone(),
            poll: Duration::from_millis(self.config.receipt_poll_ms),
            timeout: Duration::from_secs(self.config.receipt_timeout_seconds),
        })
    }
}

/// A submitted transaction awaiting confirmation.
pub struct PendingTransaction {
    hash: TxHash,
    wallet: Arc<dyn WalletProvider>,
    poll: Duration,
    timeout: Duration,
}

impl PendingTransaction {
    /// Polls until the transaction is mined and returns its receipt.
    ///
    /// A mined-but-reverted transaction still returns `Ok`; check
    /// [`TransactionReceipt::is_success`].
    #[instrument(skip(self), fields(hash = %self.hash))]
    pub async fn wait(&self) -> Result<TransactionReceipt> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            if let Some(receipt) = self.wallet.transaction_receipt(self.hash).await? {
                info!(
                    success = receipt.is_success(),
                    url = %tx_explorer_url(&self.hash),
                    "Transaction mined"
                );
                return Ok(receipt);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(NameServiceError::ReceiptTimeout {
                    hash: format!("{:#x}", self.hash),
                    seconds: self.timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll).await;
        }
    }

    /// Waits for the receipt and turns a revert into an error.
    pub async fn confirm(&self) -> Result<TransactionReceipt> {
        let receipt = self.wait().await?;
        if !receipt.is_success() {
            return Err(NameServiceError::TransactionReverted {
                hash: format!("{:#x}", self.hash),
            });
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChain;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn contract(chain: &Arc<FakeChain>) -> DomainsContract {
        DomainsContract::with_config(
            chain.clone(),
            ContractConfig {
                receipt_poll_ms: 1,
                receipt_timeout_seconds: 5,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_reads() {
        let chain = FakeChain::new();
        chain.seed_name("ninja", alice(), "hello");
        chain.seed_name("pirate", alice(), "");

        let contract = contract(&chain);

        assert_eq!(contract.get_all_names().await.unwrap(), vec!["ninja", "pirate"]);
        assert_eq!(contract.record("ninja").await.unwrap(), "hello");
        assert_eq!(contract.owner("ninja").await.unwrap(), alice());
        assert_eq!(contract.owner("nobody").await.unwrap(), Address::ZERO);
    }

    #[tokio::test]
    async fn test_register_then_set_record() {
        let chain = FakeChain::new();
        let contract = contract(&chain);

        let value = U256::from(300_000_000_000_000_000u128);
        let pending = contract.register(alice(), "abcd", value).await.unwrap();
        assert!(pending.confirm().await.unwrap().is_success());

        let pending = contract.set_record(alice(), "abcd", "hello").await.unwrap();
        pending.confirm().await.unwrap();

        let txs = chain.transactions();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].value, value);
        assert_eq!(txs[0].call, "register(abcd)");
        assert_eq!(txs[1].call, "setRecord(abcd,hello)");
        assert_eq!(contract.record("abcd").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_reverted_transaction() {
        let chain = FakeChain::new();
        chain.set_revert_register(true);
        let contract = contract(&chain);

        let pending = contract.register(alice(), "abcd", U256::ZERO).await.unwrap();
        assert!(!pending.wait().await.unwrap().is_success());
        assert!(matches!(
            pending.confirm().await,
            Err(NameServiceError::TransactionReverted { .. })
        ));
    }

    #[test]
    fn test_tx_explorer_url() {
        let hash = TxHash::repeat_byte(0x01);
        assert_eq!(
            tx_explorer_url(&hash),
            format!("https://mumbai.polygonscan.com/tx/0x{}", "01".repeat(32))
        );
    }
}

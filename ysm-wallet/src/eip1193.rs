//! Typed EIP-1193 methods on top of any [`WalletProvider`].

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use ysm_core::error::{NameServiceError, Result};
use ysm_core::traits::WalletProvider;
use ysm_core::types::{parse_address, ChainDefinition, ChainId};

/// A transaction for the wallet to sign and broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Sending account (must be one the wallet controls)
    pub from: Address,
    /// Contract address
    pub to: Address,
    /// ABI-encoded call data
    pub data: Vec<u8>,
    /// Native currency attached, in wei
    pub value: U256,
}

impl TransactionRequest {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "from": format!("{:#x}", self.from),
            "to": format!("{:#x}", self.to),
            "data": format!("0x{}", hex::encode(&self.data)),
            "value": format!("0x{:x}", self.value),
        })
    }
}

/// Subset of a transaction receipt the client cares about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Hash of the mined transaction
    pub transaction_hash: TxHash,
    /// `0x1` on success, `0x0` on revert
    #[serde(default)]
    pub status: Option<String>,
    /// Block the transaction was mined in
    #[serde(default)]
    pub block_number: Option<String>,
}

impl TransactionReceipt {
    /// Whether the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_deref(), Some("0x1") | Some("0x01"))
    }
}

fn parse_accounts(value: serde_json::Value) -> Result<Vec<Address>> {
    let raw: Vec<String> = serde_json::from_value(value)?;
    raw.iter().map(|s| parse_address(s)).collect()
}

fn decode_hex(value: &serde_json::Value, method: &str) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| NameServiceError::RpcError(format!("{}: expected hex string", method)))?;
    Ok(hex::decode(s.trim_start_matches("0x"))?)
}

/// EIP-1193 method vocabulary, available on every [`WalletProvider`].
#[async_trait]
pub trait WalletExt: WalletProvider {
    /// `eth_requestAccounts`: prompts the user to connect.
    #[instrument(skip(self))]
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let value = self.request("eth_requestAccounts", serde_json::json!([])).await?;
        parse_accounts(value)
    }

    /// `eth_accounts`: already-authorized accounts, no prompt.
    #[instrument(skip(self))]
    async fn accounts(&self) -> Result<Vec<Address>> {
        let value = self.request("eth_accounts", serde_json::json!([])).await?;
        parse_accounts(value)
    }

    /// `eth_chainId`: the active network.
    async fn chain_id(&self) -> Result<ChainId> {
        let value = self.request("eth_chainId", serde_json::json!([])).await?;
        let s = value
            .as_str()
            .ok_or_else(|| NameServiceError::RpcError("eth_chainId: expected string".into()))?;
        ChainId::parse(s)
    }

    /// `wallet_switchEthereumChain`.
    #[instrument(skip(self))]
    async fn switch_chain(&self, chain: ChainId) -> Result<()> {
        self.request(
            "wallet_switchEthereumChain",
            serde_json::json!([{ "chainId": chain.to_hex() }]),
        )
        .await?;
        Ok(())
    }

    /// `wallet_addEthereumChain`.
    #[instrument(skip(self, definition), fields(chain = %definition.chain_id))]
    async fn add_chain(&self, definition: &ChainDefinition) -> Result<()> {
        self.request("wallet_addEthereumChain", serde_json::json!([definition]))
            .await?;
        Ok(())
    }

    /// `eth_call` against the latest block; returns raw return data.
    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let value = self
            .request(
                "eth_call",
                serde_json::json!([
                    {
                        "to": format!("{:#x}", to),
                        "data": format!("0x{}", hex::encode(data)),
                    },
                    "latest"
                ]),
            )
            .await?;
        decode_hex(&value, "eth_call")
    }

    /// `eth_sendTransaction`: the wallet signs and broadcasts.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash> {
        let value = self
            .request("eth_sendTransaction", serde_json::json!([tx.to_json()]))
            .await?;
        let s = value
            .as_str()
            .ok_or_else(|| NameServiceError::RpcError("eth_sendTransaction: expected hash".into()))?;
        let hash = s
            .parse::<TxHash>()
            .map_err(|e| NameServiceError::RpcError(format!("eth_sendTransaction: {}", e)))?;
        debug!(%hash, "Transaction submitted");
        Ok(hash)
    }

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        let value = self
            .request(
                "eth_getTransactionReceipt",
                serde_json::json!([format!("{:#x}", hash)]),
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}

impl<T: WalletProvider + ?Sized> WalletExt for T {}

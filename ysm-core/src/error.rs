//! Error types for the YSM name service client.
//!
//! Errors are grouped by the collaborator that produced them: the wallet
//! provider, the transport underneath it, the contract, or local validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{UNRECOGNIZED_CHAIN, USER_REJECTED_REQUEST};

/// Result type alias using `NameServiceError`.
pub type Result<T> = std::result::Result<T, NameServiceError>;

/// An EIP-1193 provider error, as returned by the wallet.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    /// Numeric error code (EIP-1193 or JSON-RPC)
    pub code: i64,
    /// Human-readable message from the wallet
    pub message: String,
    /// Optional extra payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderRpcError {
    /// Creates a provider error without extra data.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// The user declined the prompt in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    /// The wallet does not know the requested chain.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN
    }
}

/// Main error type for all name service operations.
#[derive(Debug, Error)]
pub enum NameServiceError {
    // ═══════════════════════════════════════════════════════════════════════════
    // WALLET ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The wallet answered with an EIP-1193 error.
    #[error(transparent)]
    Provider(#[from] ProviderRpcError),

    /// The wallet returned no accounts where at least one was required.
    #[error("Wallet returned no accounts")]
    NoAccounts,

    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request to the provider failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Connection or request timeout.
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    /// The provider answered with something that is not a valid JSON-RPC response.
    #[error("Malformed RPC response: {0}")]
    RpcError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONTRACT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Contract return data could not be decoded.
    #[error("ABI decoding failed: {0}")]
    AbiError(String),

    /// Transaction was mined but reverted.
    #[error("Transaction {hash} reverted")]
    TransactionReverted {
        /// Transaction hash
        hash: String,
    },

    /// No receipt appeared before the deadline.
    #[error("No receipt for transaction {hash} after {seconds}s")]
    ReceiptTimeout {
        /// Transaction hash
        hash: String,
        /// How long we waited
        seconds: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid chain id.
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl NameServiceError {
    /// Returns true if the user declined the request in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, NameServiceError::Provider(e) if e.is_user_rejection())
    }

    /// Returns true if the wallet does not know the requested chain.
    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self, NameServiceError::Provider(e) if e.is_unrecognized_chain())
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            NameServiceError::ValidationError(_)
                | NameServiceError::InvalidAddress(_)
                | NameServiceError::InvalidChainId(_)
        )
    }
}

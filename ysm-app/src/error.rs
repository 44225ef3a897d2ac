//! Orchestration outcomes.

use thiserror::Error;

use ysm_core::error::NameServiceError;

/// Result type alias using [`AppError`].
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Why a user action did not complete.
#[derive(Debug, Error)]
pub enum AppError {
    // ═══════════════════════════════════════════════════════════════════════════
    // PRECONDITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// No wallet provider is installed or reachable.
    #[error("No wallet provider available")]
    NoWallet,

    /// No account is connected.
    #[error("Wallet not connected")]
    NotConnected,

    /// The wallet is on another network.
    #[error("Wallet is on the wrong network")]
    WrongNetwork,

    /// A mint or update is already waiting on the wallet.
    #[error("Another request is already in flight")]
    RequestInFlight,

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL VALIDATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Candidate name is too short to mint.
    #[error("Domain must be at least {min} characters long")]
    NameTooShort {
        /// Minimum length in characters
        min: usize,
    },

    /// A required form field is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    // ═══════════════════════════════════════════════════════════════════════════
    // WALLET / CHAIN
    // ═══════════════════════════════════════════════════════════════════════════

    /// A submitted transaction was rejected, reverted or never confirmed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] NameServiceError),

    /// Any other wallet, contract or decoding failure.
    #[error(transparent)]
    Service(#[from] NameServiceError),
}

impl AppError {
    /// Returns true if the user declined the request in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            AppError::TransactionFailed(e) | AppError::Service(e) => e.is_user_rejection(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ysm_core::error::ProviderRpcError;

    #[test]
    fn test_display() {
        assert_eq!(
            AppError::NameTooShort { min: 3 }.to_string(),
            "Domain must be at least 3 characters long"
        );
        assert_eq!(AppError::EmptyField("record").to_string(), "record must not be empty");
    }

    #[test]
    fn test_classification() {
        let rejected = NameServiceError::from(ProviderRpcError::new(4001, "User denied"));
        assert!(AppError::TransactionFailed(rejected).is_user_rejection());
        assert!(!AppError::Service(NameServiceError::NoAccounts).is_user_rejection());
    }
}

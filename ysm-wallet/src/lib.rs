//! # YSM Wallet
//!
//! Access to an EIP-1193 wallet provider.
//!
//! - [`HttpWalletProvider`]: the provider reached over HTTP JSON-RPC, with
//!   detection and a chain-change watcher
//! - [`WalletExt`]: typed account, network, call and transaction methods on
//!   any [`ysm_core::WalletProvider`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use ysm_wallet::{HttpWalletProvider, WalletConfig, WalletExt};
//!
//! if let Some(wallet) = HttpWalletProvider::detect(WalletConfig::default()).await? {
//!     let accounts = wallet.request_accounts().await?;
//!     println!("connected as {}", accounts[0]);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod eip1193;
mod http;

pub use eip1193::{TransactionReceipt, TransactionRequest, WalletExt};
pub use http::{HttpWalletProvider, WalletConfig};

//! # YSM Contract
//!
//! Typed access to the `.ysm` name-service contract through a wallet
//! provider. Reads are `eth_call`s, writes are signed and broadcast by the
//! wallet and confirmed by polling for the receipt.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod abi;
mod domains;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use abi::IDomains;
pub use domains::{tx_explorer_url, ContractConfig, DomainsContract, PendingTransaction};

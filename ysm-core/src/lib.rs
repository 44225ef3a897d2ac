//! # YSM Core
//!
//! Core types, errors, and traits for the `.ysm` name service client.
//!
//! This crate provides the building blocks shared by every other crate in the
//! workspace:
//!
//! - **Types**: session, form, directory and chain models
//! - **Errors**: the error taxonomy, including EIP-1193 provider errors
//! - **Constants**: contract address, target network, known chain ids
//! - **Pricing**: the length-tiered mint price schedule
//! - **Traits**: the wallet provider and notification seams
//!
//! ## Example
//!
//! ```rust
//! use ysm_core::{pricing, MintedName};
//!
//! assert_eq!(pricing::price_label("abcd"), Some("0.3"));
//! assert_eq!(MintedName::display_name_for("ninja"), "ninja.ysm");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod pricing;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{NameServiceError, ProviderRpcError, Result};
pub use traits::*;
pub use types::*;

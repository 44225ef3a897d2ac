//! Domain types for the name service client.
//!
//! - [`ChainId`] / [`ChainDefinition`]: network identity and the add-chain payload
//! - [`Session`]: which account and network the wallet currently represents
//! - [`DomainRequest`] / [`RequestStatus`]: form state around mint and update
//! - [`MintedName`]: one entry of the on-chain directory

mod chain;
mod directory;
mod session;

pub use chain::*;
pub use directory::*;
pub use session::*;

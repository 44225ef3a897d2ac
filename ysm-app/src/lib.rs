//! # YSM App
//!
//! The connection & mint orchestrator for the `.ysm` name service.
//!
//! [`NameService`] holds an immutable [`AppState`] snapshot (session,
//! directory, form, request status) and replaces it through transition
//! functions as wallet and contract calls complete. Front ends render
//! [`AppState::view`] and [`AppState::directory_entries`] and call the
//! operations on [`NameService`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ysm_app::{AppConfig, NameService};
//! use ysm_core::LogNotifier;
//!
//! let service = NameService::detect(AppConfig::from_env()?, Arc::new(LogNotifier)).await?;
//! service.refresh_session().await?;
//! service.connect().await?;
//! service.mint("ninja", "hello").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod error;
mod service;
mod state;
mod view;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use service::{NameService, NO_WALLET_MESSAGE, TRANSACTION_FAILED_MESSAGE};
pub use state::AppState;
pub use view::{select_view, DirectoryEntry, View};

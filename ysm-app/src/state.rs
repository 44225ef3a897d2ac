//! Immutable application state.
//!
//! Every change produces a new [`AppState`] through one of the transition
//! functions below; the orchestrator swaps the whole snapshot and publishes
//! it to observers.

use std::sync::Arc;

use alloy::primitives::Address;

use ysm_core::types::{ChainId, DomainRequest, MintedName, RequestStatus, Session};

use crate::view::{select_view, DirectoryEntry, View};

/// Snapshot of everything the views render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppState {
    /// Connected account and active network
    pub session: Session,
    /// Last successfully fetched directory
    pub directory: Arc<[MintedName]>,
    /// Form inputs
    pub form: DomainRequest,
    /// Mint/update status
    pub status: RequestStatus,
    /// Bumped by every hard reset; work started under an older epoch is stale
    pub epoch: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: Session::default(),
            directory: Arc::from(Vec::new()),
            form: DomainRequest::default(),
            status: RequestStatus::Idle,
            epoch: 0,
        }
    }
}

impl AppState {
    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Sets (or clears) the connected account.
    pub fn with_account(mut self, address: Option<Address>) -> Self {
        self.session.address = address;
        self
    }

    /// Sets the active network.
    pub fn with_chain(mut self, chain: Option<ChainId>) -> Self {
        self.session.chain_id = chain;
        self
    }

    /// Replaces the directory snapshot.
    pub fn with_directory(mut self, directory: Vec<MintedName>) -> Self {
        self.directory = Arc::from(directory);
        self
    }

    /// Updates the candidate name.
    pub fn with_domain_input(mut self, name: impl Into<String>) -> Self {
        self.form.name = name.into();
        self
    }

    /// Updates the candidate record.
    pub fn with_record_input(mut self, record: impl Into<String>) -> Self {
        self.form.record = record.into();
        self
    }

    /// Enters editing mode for `name`, keeping the record input.
    pub fn editing(mut self, name: impl Into<String>) -> Self {
        self.form.name = name.into();
        self.form.editing = true;
        self
    }

    /// Leaves editing mode.
    pub fn cancel_edit(mut self) -> Self {
        self.form.editing = false;
        self
    }

    /// Clears the form after a successful submission.
    pub fn cleared_form(mut self) -> Self {
        self.form = DomainRequest::default();
        self
    }

    /// Sets the request status.
    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = status;
        self
    }

    /// Fresh state in a new epoch.
    pub fn reset(self) -> Self {
        Self {
            epoch: self.epoch + 1,
            ..Self::default()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DERIVED
    // ═══════════════════════════════════════════════════════════════════════════

    /// The primary view.
    pub fn view(&self) -> View {
        select_view(&self.session, &self.form)
    }

    /// Whether the directory listing renders.
    pub fn shows_directory(&self) -> bool {
        self.session.is_connected() && !self.directory.is_empty()
    }

    /// Directory rows for the connected account.
    pub fn directory_entries(&self) -> Vec<DirectoryEntry> {
        self.directory
            .iter()
            .map(|name| DirectoryEntry::new(name, &self.session))
            .collect()
    }

    /// Whether mint/update actions should be disabled.
    pub fn is_busy(&self) -> bool {
        self.status.is_in_flight()
    }
}

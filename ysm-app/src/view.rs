//! Which screen to show, derived from the state snapshot.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use ysm_core::types::{DomainRequest, MintedName, Session};

/// The primary view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    /// Prompt to connect a wallet
    NotConnected,
    /// Prompt to switch to the target network
    WrongNetwork,
    /// Name + record inputs with a mint action
    MintForm,
    /// Record input for an existing name
    EditRecord {
        /// Name being edited
        name: String,
    },
}

/// Selects the view. Earlier rules win:
///
/// 1. no account: [`View::NotConnected`]
/// 2. account on another network: [`View::WrongNetwork`]
/// 3. not editing: [`View::MintForm`]
/// 4. editing: [`View::EditRecord`]
pub fn select_view(session: &Session, form: &DomainRequest) -> View {
    if !session.is_connected() {
        View::NotConnected
    } else if !session.on_target_network() {
        View::WrongNetwork
    } else if form.editing {
        View::EditRecord {
            name: form.name.clone(),
        }
    } else {
        View::MintForm
    }
}

/// One row of the directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Token id
    pub id: usize,
    /// Label without TLD
    pub name: String,
    /// `<label>.ysm`
    pub display_name: String,
    /// Text record
    pub record: String,
    /// Owner
    pub owner: Address,
    /// Whether the connected account may edit the record
    pub editable: bool,
    /// Asset explorer link
    pub asset_url: String,
}

impl DirectoryEntry {
    /// Row for `name` as seen by `session`.
    pub fn new(name: &MintedName, session: &Session) -> Self {
        Self {
            id: name.id,
            name: name.name.clone(),
            display_name: name.display_name(),
            record: name.record.clone(),
            owner: name.owner,
            editable: name.is_owned_by(session.address.as_ref()),
            asset_url: name.asset_url(),
        }
    }
}

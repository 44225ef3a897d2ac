//! Directory entries and the mint/update form.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::constants::{ASSET_EXPLORER_URL, CONTRACT_ADDRESS, TLD};

// ═══════════════════════════════════════════════════════════════════════════════
// MINTED NAME
// ═══════════════════════════════════════════════════════════════════════════════

/// One registered name as read from the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedName {
    /// Position in `getAllNames()`, also the token id
    pub id: usize,
    /// Label without the TLD
    pub name: String,
    /// Text record
    pub record: String,
    /// Current owner
    pub owner: Address,
}

impl MintedName {
    /// `<label>.ysm`
    pub fn display_name_for(name: &str) -> String {
        format!("{}.{}", name, TLD)
    }

    /// Full name with TLD.
    pub fn display_name(&self) -> String {
        Self::display_name_for(&self.name)
    }

    /// Whether `account` may edit this entry's record.
    pub fn is_owned_by(&self, account: Option<&Address>) -> bool {
        account == Some(&self.owner)
    }

    /// Asset explorer page for the name's token.
    pub fn asset_url(&self) -> String {
        format!("{}/{:#x}/{}", ASSET_EXPLORER_URL, CONTRACT_ADDRESS, self.id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FORM STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Candidate name/record typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRequest {
    /// Candidate label (no TLD)
    pub name: String,
    /// Candidate text record
    pub record: String,
    /// Editing an existing name's record instead of minting
    pub editing: bool,
}

/// Status of the current mutating request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// A mint or update is waiting on the wallet/chain
    InFlight,
    /// The last mint or update failed
    Failed,
}

impl RequestStatus {
    /// Whether submit actions should be disabled.
    pub fn is_in_flight(self) -> bool {
        self == RequestStatus::InFlight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(owner: Address) -> MintedName {
        MintedName {
            id: 7,
            name: "ninja".into(),
            record: "hello".into(),
            owner,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(entry(Address::ZERO).display_name(), "ninja.ysm");
    }

    #[test]
    fn test_asset_url() {
        assert_eq!(
            entry(Address::ZERO).asset_url(),
            "https://testnets.opensea.io/assets/mumbai/0x726a35006e7c763004a2557ff581e81e39fab77f/7"
        );
    }

    #[test]
    fn test_ownership() {
        let owner = Address::repeat_byte(0xab);
        let other = Address::repeat_byte(0xcd);
        let minted = entry(owner);

        assert!(minted.is_owned_by(Some(&owner)));
        assert!(!minted.is_owned_by(Some(&other)));
        assert!(!minted.is_owned_by(None));
    }

    #[test]
    fn test_status() {
        assert!(RequestStatus::InFlight.is_in_flight());
        assert!(!RequestStatus::Failed.is_in_flight());
        assert_eq!(RequestStatus::default(), RequestStatus::Idle);
    }
}

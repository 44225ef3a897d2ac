//! Mint price schedule.
//!
//! The contract charges by name length: 3 characters cost 0.5, 4 cost 0.3
//! and anything longer 0.1 of the native currency. The client mirrors the
//! schedule so it can attach the right value to `register`; the contract
//! stays authoritative and rejects a mismatched payment.

use alloy::primitives::U256;

use crate::constants::MIN_NAME_LENGTH;
use crate::error::{NameServiceError, Result};

const WEI_PER_TENTH: u128 = 100_000_000_000_000_000;

/// Length of a candidate name, in Unicode scalar values.
pub fn name_length(name: &str) -> usize {
    name.chars().count()
}

/// Price in tenths of the native currency for a name of `len` characters.
fn price_tenths(len: usize) -> Option<u128> {
    match len {
        l if l < MIN_NAME_LENGTH => None,
        3 => Some(5),
        4 => Some(3),
        _ => Some(1),
    }
}

/// Price in wei for `name`, or `None` if the name is too short to mint.
pub fn price_wei(name: &str) -> Option<U256> {
    price_tenths(name_length(name)).map(|t| U256::from(t * WEI_PER_TENTH))
}

/// Display price (in native units) for `name`.
pub fn price_label(name: &str) -> Option<&'static str> {
    match price_tenths(name_length(name))? {
        5 => Some("0.5"),
        3 => Some("0.3"),
        _ => Some("0.1"),
    }
}

/// Checks that `name` is long enough to mint.
pub fn validate_name(name: &str) -> Result<()> {
    if name_length(name) < MIN_NAME_LENGTH {
        return Err(NameServiceError::ValidationError(format!(
            "Domain must be at least {} characters long",
            MIN_NAME_LENGTH
        )));
    }
    Ok(())
}

//! Core escrow-ledger domain: composite keys, entities, registries and the
//! two transfer state machines.

pub mod accounts;
pub mod assets;
pub mod donating;
pub mod entities;
pub mod errors;
pub mod genesis;
pub mod invariants;
pub mod keys;
pub mod ledger;
pub mod selling;

pub use entities::{
    Account, Asset, Donating, DonatingByGrantee, DonatingOutcome, DonatingStatus, Selling,
    SellingByBuyer, SellingOutcome, SellingStatus, RESERVED_ACCOUNT_NAME,
};
pub use errors::LedgerError;
pub use keys::EntityTag;
pub use ledger::Ledger;

/// Reject empty required fields with the offending field's name.
pub(crate) fn require_non_empty(fields: &[(&str, &str)]) -> Result<(), LedgerError> {
    for (name, value) in fields {
        if value.is_empty() {
            return Err(LedgerError::invalid_argument(format!(
                "required field {name} is empty"
            )));
        }
    }
    Ok(())
}

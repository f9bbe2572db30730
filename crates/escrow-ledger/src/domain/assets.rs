//! # Asset Registry
//!
//! Ownership and encumbrance records, keyed by `(owner, id)`.
//!
//! Asset ids are stable for the life of the asset. A completed transfer
//! deletes the `(old_owner, id)` record and writes `(new_owner, id)`; only
//! the key's owner attribute changes.

use crate::domain::entities::Asset;
use crate::domain::errors::LedgerError;
use crate::domain::keys::EntityTag;
use crate::domain::ledger::Ledger;
use crate::domain::{accounts, require_non_empty};
use crate::ports::{LedgerStore, TxContext};
use tracing::debug;

/// Verify that `owner` holds the asset: exactly one `(owner, id)` record.
pub fn get_owned_exactly<S: LedgerStore>(
    store: &S,
    owner: &str,
    id: &str,
) -> Result<Asset, LedgerError> {
    Ledger::new(store).get_exactly_one(EntityTag::Asset, &[owner, id])
}

/// Reject assets that are already held by an open transfer.
pub fn require_unencumbered(asset: &Asset) -> Result<(), LedgerError> {
    if asset.encumbrance {
        return Err(LedgerError::invalid_state(format!(
            "asset {} is encumbered by an open transfer",
            asset.id
        )));
    }
    Ok(())
}

/// Write an asset record under its current owner.
pub fn save<S: LedgerStore>(store: &S, asset: &Asset) -> Result<(), LedgerError> {
    Ledger::new(store).write(EntityTag::Asset, &[&asset.owner, &asset.id], asset)
}

/// Move an asset to a new owner: write `(new_owner, id)`, delete the old
/// record, clear the encumbrance. The id is unchanged.
pub fn transfer<S: LedgerStore>(
    store: &S,
    asset: &Asset,
    new_owner: &str,
) -> Result<Asset, LedgerError> {
    let previous_owner = asset.owner.clone();
    let transferred = Asset {
        id: asset.id.clone(),
        owner: new_owner.to_owned(),
        encumbrance: false,
    };
    save(store, &transferred)?;
    Ledger::new(store).delete(EntityTag::Asset, &[&previous_owner, &asset.id])?;
    debug!(
        asset = %asset.id,
        from = %previous_owner,
        to = %new_owner,
        "asset ownership transferred"
    );
    Ok(transferred)
}

/// Register a new asset for `owner`.
///
/// Only the reserved operator account may register assets; the owner must
/// exist and must not be the reserved account. The new id is the invocation
/// identifier.
pub fn register<S: LedgerStore>(
    store: &S,
    ctx: &TxContext,
    operator: &str,
    owner: &str,
) -> Result<Asset, LedgerError> {
    require_non_empty(&[("operator", operator), ("owner", owner)])?;
    let operator_account = accounts::get_exactly(store, operator)?;
    if !operator_account.is_reserved() {
        return Err(LedgerError::PolicyViolation {
            account: operator_account.id,
            reason: "only the reserved account can register assets".into(),
        });
    }
    let _owner_account = accounts::get_counterparty(store, owner)?;

    let asset = Asset {
        id: ctx.tx_id().to_owned(),
        owner: owner.to_owned(),
        encumbrance: false,
    };
    save(store, &asset)?;
    debug!(asset = %asset.id, owner = %owner, "asset registered");
    Ok(asset)
}

/// Prefix-scan listing: all assets, by owner, or one by `(owner, id)`.
pub fn list<S: LedgerStore>(store: &S, prefix: &[String]) -> Result<Vec<Asset>, LedgerError> {
    let attrs: Vec<&str> = prefix.iter().map(String::as_str).collect();
    Ledger::new(store).query(EntityTag::Asset, &attrs)
}

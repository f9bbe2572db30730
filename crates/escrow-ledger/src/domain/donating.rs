//! # Donating State Machine
//!
//! offered → {done, cancelled}. A donation is a zero-consideration
//! transfer: no balances move, only ownership and encumbrance.
//!
//! Validations run before the first write; a failure leaves zero partial
//! writes.

use crate::domain::entities::{Donating, DonatingByGrantee, DonatingOutcome, DonatingStatus};
use crate::domain::errors::LedgerError;
use crate::domain::keys::{timestamp_attr, EntityTag};
use crate::domain::ledger::Ledger;
use crate::domain::{accounts, assets, require_non_empty};
use crate::ports::{LedgerStore, TxContext};
use tracing::debug;

/// Offer an asset to a grantee.
///
/// Requires distinct parties, an unencumbered asset owned by the donor and
/// an existing non-reserved grantee. Sets the encumbrance and writes the
/// offer plus its grantee-keyed mirror.
pub fn create<S: LedgerStore>(
    store: &S,
    ctx: &TxContext,
    asset_id: &str,
    donor: &str,
    grantee: &str,
) -> Result<DonatingByGrantee, LedgerError> {
    require_non_empty(&[("assetId", asset_id), ("donor", donor), ("grantee", grantee)])?;
    if donor == grantee {
        return Err(LedgerError::invalid_argument(
            "donor and grantee cannot be the same account",
        ));
    }

    let mut asset = assets::get_owned_exactly(store, donor, asset_id)?;
    let _grantee_account = accounts::get_counterparty(store, grantee)?;
    assets::require_unencumbered(&asset)?;

    let donating = Donating {
        asset_id: asset_id.to_owned(),
        donor: donor.to_owned(),
        grantee: grantee.to_owned(),
        created_at: ctx.timestamp(),
        status: DonatingStatus::Offered,
    };
    let ledger = Ledger::new(store);
    ledger.write(EntityTag::Donating, &[donor, asset_id, grantee], &donating)?;

    asset.encumbrance = true;
    assets::save(store, &asset)?;

    let mirror = DonatingByGrantee {
        grantee: grantee.to_owned(),
        created_at: donating.created_at,
        donating,
    };
    ledger.write(
        EntityTag::DonatingByGrantee,
        &[grantee, &timestamp_attr(mirror.created_at)],
        &mirror,
    )?;

    debug!(asset = %asset_id, donor = %donor, grantee = %grantee, "donation offered");
    Ok(mirror)
}

/// Close a donation offer with the requested outcome.
///
/// `done` transfers the asset to the grantee; `cancelled` only releases the
/// encumbrance. Either way the offer must still be `offered`; closed offers
/// never reopen.
pub fn resolve<S: LedgerStore>(
    store: &S,
    asset_id: &str,
    donor: &str,
    grantee: &str,
    outcome: &str,
) -> Result<DonatingByGrantee, LedgerError> {
    require_non_empty(&[
        ("assetId", asset_id),
        ("donor", donor),
        ("grantee", grantee),
        ("status", outcome),
    ])?;
    if donor == grantee {
        return Err(LedgerError::invalid_argument(
            "donor and grantee cannot be the same account",
        ));
    }
    let outcome = DonatingOutcome::parse(outcome)?;

    let ledger = Ledger::new(store);
    let mut donating: Donating =
        ledger.get_exactly_one(EntityTag::Donating, &[donor, asset_id, grantee])?;
    if donating.status != DonatingStatus::Offered {
        return Err(LedgerError::invalid_state(format!(
            "donation of asset {asset_id} is already {}",
            donating.status.as_str()
        )));
    }
    let mut asset = assets::get_owned_exactly(store, donor, asset_id)?;
    let _grantee_account = accounts::get_exactly(store, grantee)?;
    let mut mirror = find_open_grant(store, asset_id, donor, grantee)?;

    match outcome {
        DonatingOutcome::Done => {
            assets::transfer(store, &asset, grantee)?;
        }
        DonatingOutcome::Cancelled => {
            asset.encumbrance = false;
            assets::save(store, &asset)?;
        }
    }

    donating.status = outcome.closing_status();
    ledger.write(EntityTag::Donating, &[donor, asset_id, grantee], &donating)?;

    mirror.donating = donating;
    ledger.write(
        EntityTag::DonatingByGrantee,
        &[grantee, &timestamp_attr(mirror.created_at)],
        &mirror,
    )?;

    debug!(
        asset = %asset_id,
        donor = %donor,
        grantee = %grantee,
        status = mirror.donating.status.as_str(),
        "donation resolved"
    );
    Ok(mirror)
}

/// Prefix-scan listing of donations by (donor[, asset_id[, grantee]]).
pub fn list<S: LedgerStore>(store: &S, prefix: &[String]) -> Result<Vec<Donating>, LedgerError> {
    let attrs: Vec<&str> = prefix.iter().map(String::as_str).collect();
    Ledger::new(store).query(EntityTag::Donating, &attrs)
}

/// All donation records offered to one grantee, in creation order.
pub fn list_by_grantee<S: LedgerStore>(
    store: &S,
    grantee: &str,
) -> Result<Vec<DonatingByGrantee>, LedgerError> {
    require_non_empty(&[("grantee", grantee)])?;
    Ledger::new(store).query(EntityTag::DonatingByGrantee, &[grantee])
}

/// Find the grantee's mirror record for this offer.
///
/// Matching requires the embedded offer to still be `offered`, so stale
/// mirrors from earlier cancelled offers of the same asset never match.
fn find_open_grant<S: LedgerStore>(
    store: &S,
    asset_id: &str,
    donor: &str,
    grantee: &str,
) -> Result<DonatingByGrantee, LedgerError> {
    let mirrors: Vec<DonatingByGrantee> =
        Ledger::new(store).query(EntityTag::DonatingByGrantee, &[grantee])?;
    mirrors
        .into_iter()
        .find(|m| {
            m.grantee == grantee
                && m.donating.asset_id == asset_id
                && m.donating.donor == donor
                && m.donating.status == DonatingStatus::Offered
        })
        .ok_or(LedgerError::CardinalityMismatch {
            entity: "donatingByGrantee",
            attrs: vec![grantee.to_owned(), asset_id.to_owned(), donor.to_owned()],
            found: 0,
        })
}

//! # Domain Invariants
//!
//! Whole-store consistency checks:
//!
//! - Exclusive ownership: an asset is encumbered exactly when one open
//!   transfer references it, and never more than one.
//! - Value conservation: account balances plus escrowed purchase funds sum
//!   to a known total.
//! - Mirror consistency: every open deal has exactly one still-open
//!   counterparty mirror record.
//!
//! These scans are linear in store size and intended for tests and audits,
//! not the hot path.

use std::collections::HashMap;

use crate::domain::entities::{Donating, DonatingStatus, Selling, SellingStatus};
use crate::domain::errors::LedgerError;
use crate::domain::keys::EntityTag;
use crate::domain::ledger::Ledger;
use crate::domain::{accounts, assets, donating, selling};
use crate::ports::LedgerStore;

/// Exclusive ownership: `asset.encumbrance` holds exactly when one open
/// deal (an offered/in-delivery sale or an offered donation) references
/// the asset, and no asset has more than one open deal.
pub fn check_encumbrance_consistency<S: LedgerStore>(
    store: &S,
) -> Result<Vec<InvariantViolation>, LedgerError> {
    let mut open_deals: HashMap<String, usize> = HashMap::new();
    let sellings: Vec<Selling> = Ledger::new(store).query(EntityTag::Selling, &[])?;
    for s in sellings {
        if !s.status.is_terminal() {
            *open_deals.entry(s.asset_id).or_default() += 1;
        }
    }
    let donatings: Vec<Donating> = Ledger::new(store).query(EntityTag::Donating, &[])?;
    for d in donatings {
        if !d.status.is_terminal() {
            *open_deals.entry(d.asset_id).or_default() += 1;
        }
    }

    let mut violations = Vec::new();
    for asset in assets::list(store, &[])? {
        let open = open_deals.remove(&asset.id).unwrap_or(0);
        if open > 1 {
            violations.push(InvariantViolation::DoubleBooking {
                asset: asset.id.clone(),
                open_deals: open,
            });
        }
        if asset.encumbrance != (open >= 1) {
            violations.push(InvariantViolation::EncumbranceMismatch {
                asset: asset.id,
                encumbered: asset.encumbrance,
                open_deals: open,
            });
        }
    }
    // Leftovers are open deals whose asset record no longer exists.
    for (asset, open) in open_deals {
        violations.push(InvariantViolation::EncumbranceMismatch {
            asset,
            encumbered: false,
            open_deals: open,
        });
    }
    Ok(violations)
}

/// Value conservation: the sum of account balances plus the price of every
/// in-delivery sale (funds held in escrow) equals `expected_total`.
pub fn check_balance_conservation<S: LedgerStore>(
    store: &S,
    expected_total: u64,
) -> Result<Vec<InvariantViolation>, LedgerError> {
    let mut actual: u64 = 0;
    for account in accounts::list(store, &[])? {
        actual = actual.saturating_add(account.balance);
    }
    let sellings: Vec<Selling> = Ledger::new(store).query(EntityTag::Selling, &[])?;
    for s in sellings {
        if s.status == SellingStatus::InDelivery {
            actual = actual.saturating_add(s.price);
        }
    }

    if actual == expected_total {
        Ok(Vec::new())
    } else {
        Ok(vec![InvariantViolation::BalanceNotConserved {
            expected: expected_total,
            actual,
        }])
    }
}

/// Mirror consistency: every in-delivery sale has exactly one in-delivery
/// buyer mirror, and every offered donation exactly one offered grantee
/// mirror. Closed deals may leave any number of closed mirrors behind.
pub fn check_mirror_consistency<S: LedgerStore>(
    store: &S,
) -> Result<Vec<InvariantViolation>, LedgerError> {
    let mut violations = Vec::new();

    let sellings: Vec<Selling> = Ledger::new(store).query(EntityTag::Selling, &[])?;
    for s in sellings {
        if s.status != SellingStatus::InDelivery {
            continue;
        }
        let open = selling::list_by_buyer(store, &s.buyer)?
            .iter()
            .filter(|m| {
                m.selling.asset_id == s.asset_id
                    && m.selling.seller == s.seller
                    && m.selling.status == SellingStatus::InDelivery
            })
            .count();
        if open != 1 {
            violations.push(InvariantViolation::MirrorMismatch {
                asset: s.asset_id,
                account: s.buyer,
                found: open,
            });
        }
    }

    let donatings: Vec<Donating> = Ledger::new(store).query(EntityTag::Donating, &[])?;
    for d in donatings {
        if d.status != DonatingStatus::Offered {
            continue;
        }
        let open = donating::list_by_grantee(store, &d.grantee)?
            .iter()
            .filter(|m| {
                m.donating.asset_id == d.asset_id
                    && m.donating.donor == d.donor
                    && m.donating.status == DonatingStatus::Offered
            })
            .count();
        if open != 1 {
            violations.push(InvariantViolation::MirrorMismatch {
                asset: d.asset_id,
                account: d.grantee,
                found: open,
            });
        }
    }

    Ok(violations)
}

/// Run every check against the store.
pub fn check_all<S: LedgerStore>(
    store: &S,
    expected_total: u64,
) -> Result<InvariantCheckResult, LedgerError> {
    let mut violations = check_encumbrance_consistency(store)?;
    violations.extend(check_balance_conservation(store, expected_total)?);
    violations.extend(check_mirror_consistency(store)?);

    if violations.is_empty() {
        Ok(InvariantCheckResult::Valid)
    } else {
        Ok(InvariantCheckResult::Invalid(violations))
    }
}

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// More than one open transfer references the asset.
    DoubleBooking { asset: String, open_deals: usize },
    /// The encumbrance flag disagrees with the open-deal count.
    EncumbranceMismatch {
        asset: String,
        encumbered: bool,
        open_deals: usize,
    },
    /// Balances plus escrow do not sum to the expected total.
    BalanceNotConserved { expected: u64, actual: u64 },
    /// An open deal has zero or duplicate open mirror records.
    MirrorMismatch {
        asset: String,
        account: String,
        found: usize,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoubleBooking { asset, open_deals } => {
                write!(f, "asset {asset} is referenced by {open_deals} open deals")
            }
            Self::EncumbranceMismatch {
                asset,
                encumbered,
                open_deals,
            } => {
                write!(
                    f,
                    "asset {asset}: encumbrance {encumbered} with {open_deals} open deals"
                )
            }
            Self::BalanceNotConserved { expected, actual } => {
                write!(
                    f,
                    "value not conserved: expected {expected}, balances+escrow {actual}"
                )
            }
            Self::MirrorMismatch {
                asset,
                account,
                found,
            } => {
                write!(
                    f,
                    "asset {asset}: {found} open mirror records for account {account}, expected 1"
                )
            }
        }
    }
}

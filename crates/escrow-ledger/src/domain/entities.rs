//! # Domain Entities
//!
//! Record types stored in the ledger, serialized as JSON documents.
//!
//! Status fields only move forward: once a Selling or Donating reaches a
//! terminal status it never changes again, and every non-terminal record
//! holds the encumbrance on exactly one asset.

use crate::domain::errors::LedgerError;
use serde::{Deserialize, Serialize};

/// Name of the reserved operator account.
///
/// The reserved account administers the ledger (it registers assets) and is
/// barred from acting as buyer or grantee.
pub const RESERVED_ACCOUNT_NAME: &str = "manager";

/// A balance-bearing account.
///
/// Created externally (or via [`crate::domain::genesis`]); mutated only by
/// credit/debit during settlement. Keyed by `(id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Whole currency units. Unsigned, so the `balance >= 0` invariant holds
    /// by construction.
    pub balance: u64,
}

impl Account {
    /// Whether this is the reserved operator account.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.name == RESERVED_ACCOUNT_NAME
    }

    /// Add funds.
    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Remove funds, failing if the balance cannot cover the amount.
    pub fn debit(&mut self, amount: u64) -> Result<(), LedgerError> {
        if self.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}

/// A unique asset with exclusive ownership. Keyed by `(owner, id)`.
///
/// `encumbrance` is true iff exactly one non-terminal Selling or Donating
/// references the asset; an encumbered asset rejects new offers.
/// Asset ids are stable: a completed transfer moves the record from
/// `(old_owner, id)` to `(new_owner, id)` without changing `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub owner: String,
    pub encumbrance: bool,
}

/// Lifecycle of a sale listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SellingStatus {
    /// Listed, waiting for a buyer.
    Offered,
    /// A buyer committed funds into escrow; delivery in progress.
    InDelivery,
    Done,
    Cancelled,
    Expired,
}

impl SellingStatus {
    /// Terminal statuses never change again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Expired)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offered => "offered",
            Self::InDelivery => "inDelivery",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

/// Requested outcome of a settle operation, parsed from the flat string
/// argument of `UpdateSelling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellingOutcome {
    Done,
    Cancelled,
    Expired,
}

impl SellingOutcome {
    /// Parse the wire token.
    pub fn parse(token: &str) -> Result<Self, LedgerError> {
        match token {
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(LedgerError::invalid_argument(format!(
                "unknown selling status token: {other}"
            ))),
        }
    }

    /// The terminal status this outcome closes a listing into.
    #[must_use]
    pub fn closing_status(self) -> SellingStatus {
        match self {
            Self::Done => SellingStatus::Done,
            Self::Cancelled => SellingStatus::Cancelled,
            Self::Expired => SellingStatus::Expired,
        }
    }
}

/// A sale listing. Keyed by `(seller, asset_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selling {
    pub asset_id: String,
    pub seller: String,
    /// Empty until a buyer commits.
    pub buyer: String,
    pub price: u64,
    pub created_at: u64,
    /// Sale period in days.
    pub period: u64,
    pub status: SellingStatus,
}

/// Buyer-keyed mirror of a [`Selling`]. Keyed by `(buyer, created_at)`.
///
/// Written at purchase time and updated transactionally whenever the primary
/// record changes, so a buyer can list their purchases without scanning every
/// seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellingByBuyer {
    pub buyer: String,
    pub created_at: u64,
    pub selling: Selling,
}

/// Lifecycle of a donation offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DonatingStatus {
    Offered,
    Done,
    Cancelled,
}

impl DonatingStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offered => "offered",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Requested outcome of a resolve operation, parsed from the flat string
/// argument of `UpdateDonating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonatingOutcome {
    Done,
    Cancelled,
}

impl DonatingOutcome {
    /// Parse the wire token.
    pub fn parse(token: &str) -> Result<Self, LedgerError> {
        match token {
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(LedgerError::invalid_argument(format!(
                "unknown donating status token: {other}"
            ))),
        }
    }

    #[must_use]
    pub fn closing_status(self) -> DonatingStatus {
        match self {
            Self::Done => DonatingStatus::Done,
            Self::Cancelled => DonatingStatus::Cancelled,
        }
    }
}

/// A donation offer (zero-consideration transfer).
/// Keyed by `(donor, asset_id, grantee)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donating {
    pub asset_id: String,
    pub donor: String,
    pub grantee: String,
    pub created_at: u64,
    pub status: DonatingStatus,
}

/// Grantee-keyed mirror of a [`Donating`]. Keyed by `(grantee, created_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonatingByGrantee {
    pub grantee: String,
    pub created_at: u64,
    pub donating: Donating,
}

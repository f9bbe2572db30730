//! # Selling State Machine
//!
//! offered → inDelivery → {done, cancelled, expired};
//! offered → {cancelled, expired} directly.
//!
//! Funds are escrowed: the buyer is debited at purchase and nobody is
//! credited until settlement. `done` credits the seller; cancelling or
//! expiring an in-delivery sale refunds the buyer; closing from `offered`
//! moves no funds.
//!
//! Every operation validates everything it needs before its first write,
//! so a failure leaves zero partial writes.

use crate::domain::entities::{Selling, SellingByBuyer, SellingOutcome, SellingStatus};
use crate::domain::errors::LedgerError;
use crate::domain::keys::{timestamp_attr, EntityTag};
use crate::domain::ledger::Ledger;
use crate::domain::{accounts, assets, require_non_empty};
use crate::ports::{LedgerStore, TxContext};
use serde::Serialize;
use tracing::debug;

/// Record returned by [`settle`]: the bare listing when the sale closed
/// straight from `offered` (no mirror exists yet), otherwise the updated
/// buyer-keyed mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettleRecord {
    Listing(Selling),
    Receipt(SellingByBuyer),
}

/// Create a sale listing for an asset the seller owns.
///
/// `price` and `period` arrive as flat strings and must parse as unsigned
/// integers before anything is read or written. The asset must exist under
/// `(seller, asset_id)` and be unencumbered; listing it sets the
/// encumbrance.
pub fn create<S: LedgerStore>(
    store: &S,
    ctx: &TxContext,
    asset_id: &str,
    seller: &str,
    price: &str,
    period: &str,
) -> Result<Selling, LedgerError> {
    require_non_empty(&[
        ("assetId", asset_id),
        ("seller", seller),
        ("price", price),
        ("salePeriod", period),
    ])?;
    let price: u64 = price
        .parse()
        .map_err(|e| LedgerError::invalid_argument(format!("price is not numeric: {e}")))?;
    let period: u64 = period
        .parse()
        .map_err(|e| LedgerError::invalid_argument(format!("salePeriod is not numeric: {e}")))?;

    let mut asset = assets::get_owned_exactly(store, seller, asset_id)?;
    assets::require_unencumbered(&asset)?;

    let selling = Selling {
        asset_id: asset_id.to_owned(),
        seller: seller.to_owned(),
        buyer: String::new(),
        price,
        created_at: ctx.timestamp(),
        period,
        status: SellingStatus::Offered,
    };
    Ledger::new(store).write(EntityTag::Selling, &[seller, asset_id], &selling)?;

    asset.encumbrance = true;
    assets::save(store, &asset)?;

    debug!(asset = %asset_id, seller = %seller, price, "sale listed");
    Ok(selling)
}

/// Commit a buyer to an offered listing.
///
/// Requires `status == offered`, distinct parties, an existing
/// non-reserved buyer with balance ≥ price. Debits the buyer into escrow,
/// moves the listing to `inDelivery` and writes the buyer-keyed mirror.
pub fn purchase<S: LedgerStore>(
    store: &S,
    ctx: &TxContext,
    asset_id: &str,
    seller: &str,
    buyer: &str,
) -> Result<SellingByBuyer, LedgerError> {
    require_non_empty(&[("assetId", asset_id), ("seller", seller), ("buyer", buyer)])?;
    if seller == buyer {
        return Err(LedgerError::invalid_argument(
            "buyer and seller cannot be the same account",
        ));
    }

    let ledger = Ledger::new(store);
    let _asset = assets::get_owned_exactly(store, seller, asset_id)?;
    let mut selling: Selling = ledger.get_exactly_one(EntityTag::Selling, &[seller, asset_id])?;
    if selling.status != SellingStatus::Offered {
        return Err(LedgerError::invalid_state(format!(
            "listing for asset {asset_id} is {}, not open for purchase",
            selling.status.as_str()
        )));
    }
    let mut buyer_account = accounts::get_counterparty(store, buyer)?;
    if buyer_account.balance < selling.price {
        return Err(LedgerError::InsufficientBalance {
            required: selling.price,
            available: buyer_account.balance,
        });
    }

    selling.buyer = buyer.to_owned();
    selling.status = SellingStatus::InDelivery;
    ledger.write(EntityTag::Selling, &[seller, asset_id], &selling)?;

    let receipt = SellingByBuyer {
        buyer: buyer.to_owned(),
        created_at: ctx.timestamp(),
        selling: selling.clone(),
    };
    ledger.write(
        EntityTag::SellingByBuyer,
        &[buyer, &timestamp_attr(receipt.created_at)],
        &receipt,
    )?;

    buyer_account.debit(selling.price)?;
    accounts::save(store, &buyer_account)?;

    debug!(
        asset = %asset_id,
        seller = %seller,
        buyer = %buyer,
        escrowed = selling.price,
        "purchase committed, funds in escrow"
    );
    Ok(receipt)
}

/// Close a listing with the requested outcome.
///
/// - `done` requires `inDelivery`: credits the seller, transfers the asset
///   to the buyer and clears the encumbrance.
/// - `cancelled`/`expired` from `offered`: clears the encumbrance, no funds
///   move.
/// - `cancelled`/`expired` from `inDelivery`: refunds the escrowed price to
///   the buyer and clears the encumbrance.
/// - Any terminal current status is rejected; a closed sale never reopens.
pub fn settle<S: LedgerStore>(
    store: &S,
    asset_id: &str,
    seller: &str,
    buyer: &str,
    outcome: &str,
) -> Result<SettleRecord, LedgerError> {
    require_non_empty(&[("assetId", asset_id), ("seller", seller), ("status", outcome)])?;
    if !buyer.is_empty() && buyer == seller {
        return Err(LedgerError::invalid_argument(
            "buyer and seller cannot be the same account",
        ));
    }
    let outcome = SellingOutcome::parse(outcome)?;

    let ledger = Ledger::new(store);
    let selling: Selling = ledger.get_exactly_one(EntityTag::Selling, &[seller, asset_id])?;
    // Terminal status is checked before the asset lookup: after a completed
    // sale the seller-side asset record no longer exists, and re-closing must
    // still surface as an invalid transition.
    if selling.status.is_terminal() {
        return Err(LedgerError::invalid_state(format!(
            "sale of asset {asset_id} is already {}",
            selling.status.as_str()
        )));
    }
    let asset = assets::get_owned_exactly(store, seller, asset_id)?;

    match selling.status {
        SellingStatus::Offered => match outcome {
            SellingOutcome::Done => Err(LedgerError::invalid_state(format!(
                "sale of asset {asset_id} is not in delivery, cannot confirm"
            ))),
            SellingOutcome::Cancelled | SellingOutcome::Expired => {
                close_from_offered(store, asset, selling, outcome)
            }
        },
        SellingStatus::InDelivery => {
            // Closing an in-delivery sale always involves the buyer.
            require_non_empty(&[("buyer", buyer)])?;
            match outcome {
                SellingOutcome::Done => settle_done(store, asset, selling, buyer),
                SellingOutcome::Cancelled | SellingOutcome::Expired => {
                    close_from_delivery(store, asset, selling, buyer, outcome)
                }
            }
        }
        // Terminal statuses returned above.
        _ => unreachable!(),
    }
}

/// Prefix-scan listing of sales by (seller[, asset_id]).
pub fn list<S: LedgerStore>(store: &S, prefix: &[String]) -> Result<Vec<Selling>, LedgerError> {
    let attrs: Vec<&str> = prefix.iter().map(String::as_str).collect();
    Ledger::new(store).query(EntityTag::Selling, &attrs)
}

/// All purchase records of one buyer, in creation order.
pub fn list_by_buyer<S: LedgerStore>(
    store: &S,
    buyer: &str,
) -> Result<Vec<SellingByBuyer>, LedgerError> {
    require_non_empty(&[("buyer", buyer)])?;
    Ledger::new(store).query(EntityTag::SellingByBuyer, &[buyer])
}

/// Find the buyer's mirror record for this sale.
///
/// A buyer can hold several historical mirrors for the same asset/seller
/// pair (earlier cancelled or expired attempts), so the match requires the
/// embedded listing to still be `inDelivery`.
fn find_active_receipt<S: LedgerStore>(
    store: &S,
    asset_id: &str,
    seller: &str,
    buyer: &str,
) -> Result<SellingByBuyer, LedgerError> {
    let receipts: Vec<SellingByBuyer> =
        Ledger::new(store).query(EntityTag::SellingByBuyer, &[buyer])?;
    receipts
        .into_iter()
        .find(|r| {
            r.buyer == buyer
                && r.selling.asset_id == asset_id
                && r.selling.seller == seller
                && r.selling.status == SellingStatus::InDelivery
        })
        .ok_or(LedgerError::CardinalityMismatch {
            entity: "sellingByBuyer",
            attrs: vec![buyer.to_owned(), asset_id.to_owned(), seller.to_owned()],
            found: 0,
        })
}

fn settle_done<S: LedgerStore>(
    store: &S,
    asset: crate::domain::entities::Asset,
    mut selling: Selling,
    buyer: &str,
) -> Result<SettleRecord, LedgerError> {
    // Remaining reads, before any write.
    let mut receipt = find_active_receipt(store, &selling.asset_id, &selling.seller, buyer)?;
    let mut seller_account = accounts::get_exactly(store, &selling.seller)?;

    seller_account.credit(selling.price);
    accounts::save(store, &seller_account)?;

    assets::transfer(store, &asset, buyer)?;

    selling.status = SellingStatus::Done;
    Ledger::new(store).write(
        EntityTag::Selling,
        &[&selling.seller, &selling.asset_id],
        &selling,
    )?;

    receipt.selling = selling;
    Ledger::new(store).write(
        EntityTag::SellingByBuyer,
        &[&receipt.buyer, &timestamp_attr(receipt.created_at)],
        &receipt,
    )?;

    debug!(
        asset = %receipt.selling.asset_id,
        seller = %receipt.selling.seller,
        buyer = %buyer,
        price = receipt.selling.price,
        "sale settled, seller credited"
    );
    Ok(SettleRecord::Receipt(receipt))
}

fn close_from_offered<S: LedgerStore>(
    store: &S,
    mut asset: crate::domain::entities::Asset,
    mut selling: Selling,
    outcome: SellingOutcome,
) -> Result<SettleRecord, LedgerError> {
    asset.encumbrance = false;
    assets::save(store, &asset)?;

    selling.status = outcome.closing_status();
    Ledger::new(store).write(
        EntityTag::Selling,
        &[&selling.seller, &selling.asset_id],
        &selling,
    )?;

    debug!(
        asset = %selling.asset_id,
        seller = %selling.seller,
        status = selling.status.as_str(),
        "offered sale closed, no funds moved"
    );
    Ok(SettleRecord::Listing(selling))
}

fn close_from_delivery<S: LedgerStore>(
    store: &S,
    mut asset: crate::domain::entities::Asset,
    mut selling: Selling,
    buyer: &str,
    outcome: SellingOutcome,
) -> Result<SettleRecord, LedgerError> {
    // Remaining reads, before any write.
    let mut receipt = find_active_receipt(store, &selling.asset_id, &selling.seller, buyer)?;
    let mut buyer_account = accounts::get_exactly(store, buyer)?;

    // Refund exactly the amount escrowed at purchase.
    buyer_account.credit(selling.price);
    accounts::save(store, &buyer_account)?;

    asset.encumbrance = false;
    assets::save(store, &asset)?;

    selling.status = outcome.closing_status();
    Ledger::new(store).write(
        EntityTag::Selling,
        &[&selling.seller, &selling.asset_id],
        &selling,
    )?;

    receipt.selling = selling;
    Ledger::new(store).write(
        EntityTag::SellingByBuyer,
        &[&receipt.buyer, &timestamp_attr(receipt.created_at)],
        &receipt,
    )?;

    debug!(
        asset = %receipt.selling.asset_id,
        buyer = %buyer,
        refunded = receipt.selling.price,
        status = receipt.selling.status.as_str(),
        "in-delivery sale closed, buyer refunded"
    );
    Ok(SettleRecord::Receipt(receipt))
}

//! # Account Registry
//!
//! Balance-bearing account records, keyed by `(id)`.
//!
//! Balance changes are read-modify-write: the caller reads the account,
//! mutates it in memory and writes it back; isolation comes from the
//! enclosing host transaction.

use crate::domain::entities::Account;
use crate::domain::errors::LedgerError;
use crate::domain::keys::EntityTag;
use crate::domain::ledger::Ledger;
use crate::ports::LedgerStore;

/// Full-key lookup of one account. Zero or more than one match means the
/// registry itself is inconsistent and surfaces as a cardinality error.
pub fn get_exactly<S: LedgerStore>(store: &S, id: &str) -> Result<Account, LedgerError> {
    Ledger::new(store).get_exactly_one(EntityTag::Account, &[id])
}

/// Fetch an account that is about to receive an asset or spend funds.
///
/// The reserved operator account may never act as a counterparty.
pub fn get_counterparty<S: LedgerStore>(store: &S, id: &str) -> Result<Account, LedgerError> {
    let account = get_exactly(store, id)?;
    if account.is_reserved() {
        return Err(LedgerError::PolicyViolation {
            account: account.id,
            reason: "reserved account cannot act as a counterparty".into(),
        });
    }
    Ok(account)
}

/// Write an account record back.
pub fn save<S: LedgerStore>(store: &S, account: &Account) -> Result<(), LedgerError> {
    Ledger::new(store).write(EntityTag::Account, &[&account.id], account)
}

/// Prefix-scan listing: all accounts, or one by id.
pub fn list<S: LedgerStore>(store: &S, prefix: &[String]) -> Result<Vec<Account>, LedgerError> {
    let attrs: Vec<&str> = prefix.iter().map(String::as_str).collect();
    Ledger::new(store).query(EntityTag::Account, &attrs)
}

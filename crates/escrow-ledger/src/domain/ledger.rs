//! # Ledger Access Layer
//!
//! Generic typed read/write access built on the composite key index.
//!
//! No atomicity lives here: atomicity is a property of the whole invocation,
//! provided by the hosting platform. Each method performs exactly one store
//! call.

use crate::domain::errors::LedgerError;
use crate::domain::keys::{self, EntityTag};
use crate::ports::LedgerStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Typed facade over a [`LedgerStore`].
pub struct Ledger<'a, S: LedgerStore> {
    store: &'a S,
}

impl<'a, S: LedgerStore> Ledger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Serialize `entity`, compute its composite key and upsert it.
    pub fn write<T: Serialize>(
        &self,
        tag: EntityTag,
        attrs: &[&str],
        entity: &T,
    ) -> Result<(), LedgerError> {
        let key = keys::encode(tag, attrs)?;
        let value = serde_json::to_vec(entity)
            .map_err(|e| LedgerError::serialization(format!("encoding {}: {e}", tag.as_str())))?;
        self.store.put(&key, &value)?;
        Ok(())
    }

    /// Remove the record at the exact composite key.
    pub fn delete(&self, tag: EntityTag, attrs: &[&str]) -> Result<(), LedgerError> {
        let key = keys::encode(tag, attrs)?;
        self.store.delete(&key)?;
        Ok(())
    }

    /// Decode every record whose attribute tuple starts with `attrs`,
    /// in key order. An empty result is success, not an error.
    pub fn query<T: DeserializeOwned>(
        &self,
        tag: EntityTag,
        attrs: &[&str],
    ) -> Result<Vec<T>, LedgerError> {
        let prefix = keys::prefix(tag, attrs)?;
        let entries = self.store.prefix_scan(&prefix)?;
        entries
            .iter()
            .map(|(_, value)| {
                serde_json::from_slice(value).map_err(|e| {
                    LedgerError::serialization(format!("decoding {}: {e}", tag.as_str()))
                })
            })
            .collect()
    }

    /// Fetch the single record matching `attrs`.
    ///
    /// Zero or more than one match is a [`LedgerError::CardinalityMismatch`];
    /// the caller owns the cardinality expectation, not the index.
    pub fn get_exactly_one<T: DeserializeOwned>(
        &self,
        tag: EntityTag,
        attrs: &[&str],
    ) -> Result<T, LedgerError> {
        let mut matches = self.query::<T>(tag, attrs)?;
        if matches.len() != 1 {
            return Err(LedgerError::CardinalityMismatch {
                entity: tag.as_str(),
                attrs: attrs.iter().map(|a| (*a).to_owned()).collect(),
                found: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::domain::entities::Account;

    fn account(id: &str, balance: u64) -> Account {
        Account {
            id: id.into(),
            name: format!("user-{id}"),
            balance,
        }
    }

    #[test]
    fn test_write_then_query() {
        let store = InMemoryLedgerStore::new();
        let ledger = Ledger::new(&store);

        ledger
            .write(EntityTag::Account, &["a1"], &account("a1", 100))
            .unwrap();
        ledger
            .write(EntityTag::Account, &["a2"], &account("a2", 200))
            .unwrap();

        let all: Vec<Account> = ledger.query(EntityTag::Account, &[]).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a1");
        assert_eq!(all[1].id, "a2");
    }

    #[test]
    fn test_query_empty_is_success() {
        let store = InMemoryLedgerStore::new();
        let ledger = Ledger::new(&store);
        let none: Vec<Account> = ledger.query(EntityTag::Account, &["missing"]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_get_exactly_one_cardinality() {
        let store = InMemoryLedgerStore::new();
        let ledger = Ledger::new(&store);

        let err = ledger
            .get_exactly_one::<Account>(EntityTag::Account, &["a1"])
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CardinalityMismatch { found: 0, .. }
        ));

        ledger
            .write(EntityTag::Account, &["a1"], &account("a1", 100))
            .unwrap();
        let found: Account = ledger
            .get_exactly_one(EntityTag::Account, &["a1"])
            .unwrap();
        assert_eq!(found.balance, 100);
    }

    #[test]
    fn test_delete_removes_record() {
        let store = InMemoryLedgerStore::new();
        let ledger = Ledger::new(&store);

        ledger
            .write(EntityTag::Account, &["a1"], &account("a1", 100))
            .unwrap();
        ledger.delete(EntityTag::Account, &["a1"]).unwrap();

        let all: Vec<Account> = ledger.query(EntityTag::Account, &[]).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_corrupt_record_is_serialization_error() {
        let store = InMemoryLedgerStore::new();
        let key = keys::encode(EntityTag::Account, &["a1"]).unwrap();
        store.put(&key, b"not-json").unwrap();

        let ledger = Ledger::new(&store);
        let err = ledger
            .query::<Account>(EntityTag::Account, &["a1"])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Serialization { .. }));
    }
}

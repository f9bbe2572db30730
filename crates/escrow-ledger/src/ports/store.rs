//! # Ledger Store Port (Driven Port)
//!
//! Abstraction over the versioned key-value store the hosting platform
//! provides. The host guarantees that all writes performed during one
//! invocation become visible atomically or not at all; this crate never
//! retries, locks, or blocks.
//!
//! Production hosts back this with their replicated state database.
//! Testing: [`crate::adapters::InMemoryLedgerStore`].

use thiserror::Error;

/// Abstract interface for the backing key-value store.
///
/// Keys are opaque byte strings produced by [`crate::domain::keys`].
/// `prefix_scan` MUST return entries in ascending key order; the mirror
/// tie-break rules in the state machines rely on it.
pub trait LedgerStore: Send + Sync {
    /// Get a value by exact key. Absence is `Ok(None)`, not an error.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Upsert a single key-value pair.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is a no-op.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Iterate over all entries whose key starts with `prefix`,
    /// in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// Storage operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Underlying backend failure.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Per-invocation transaction context supplied by the host.
///
/// Every operation's read-set and write-set is fully determined by its
/// declared inputs plus this context; the core keeps no process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    /// Monotonic per-invocation timestamp.
    timestamp: u64,
    /// Unique invocation identifier.
    tx_id: String,
}

impl TxContext {
    /// Create a context from host-supplied values.
    pub fn new(timestamp: u64, tx_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            tx_id: tx_id.into(),
        }
    }

    /// The invocation timestamp.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The invocation identifier.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_context_accessors() {
        let ctx = TxContext::new(42, "tx-1");
        assert_eq!(ctx.timestamp(), 42);
        assert_eq!(ctx.tx_id(), "tx-1");
    }
}

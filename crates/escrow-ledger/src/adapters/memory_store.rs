use crate::ports::{LedgerStore, StoreError, TxContext};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of LedgerStore for testing and single-node use.
///
/// A `BTreeMap` keeps keys in byte order, so prefix scans come back sorted
/// the way a range-partitioned backend would return them.
pub struct InMemoryLedgerStore {
    cells: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of live records.
    pub fn len(&self) -> Result<usize, StoreError> {
        let cells = self.cells.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(cells.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let cells = self.cells.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(cells.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut cells = self.cells.write().map_err(|_| StoreError::LockPoisoned)?;
        cells.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut cells = self.cells.write().map_err(|_| StoreError::LockPoisoned)?;
        cells.remove(key);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let cells = self.cells.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(cells
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Mints one [`TxContext`] per invocation: a monotonic timestamp and a
/// random transaction id.
pub struct InvocationFactory {
    clock: AtomicU64,
}

impl InvocationFactory {
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            clock: AtomicU64::new(start),
        }
    }

    pub fn next(&self) -> TxContext {
        let timestamp = self.clock.fetch_add(1, Ordering::SeqCst);
        TxContext::new(timestamp, Uuid::new_v4().to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

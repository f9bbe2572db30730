//! # Ports
//!
//! Interfaces between the ledger core and its host.
//!
//! The core consumes a [`LedgerStore`] (driven port) supplied by the hosting
//! platform, together with a per-invocation [`TxContext`]. There is no inbound
//! trait: the operation surface is the closed [`crate::service::Request`] enum.

pub mod store;

pub use store::{LedgerStore, StoreError, TxContext};

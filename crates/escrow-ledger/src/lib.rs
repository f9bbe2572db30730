//! # escrow-ledger
//!
//! Exclusive-ownership transfer over an append-only key-value ledger.
//!
//! ## Role in System
//!
//! - **Composite key index**: multi-attribute records on a flat byte
//!   keyspace, queried by prefix scan
//! - **Registries**: accounts with balances, assets with an exclusive owner
//!   and an encumbrance flag
//! - **State machines**: escrowed sales (`offered → inDelivery → done /
//!   cancelled / expired`) and donations (`offered → done / cancelled`)
//!
//! ## Flow
//!
//! ```text
//! [caller] ──(name, args)──→ [service] ──Request──→ [domain]
//!                                                      │
//!                          [LedgerStore] ←──get/put/scan┘
//! ```
//!
//! Every mutation validates all of its inputs and preconditions before its
//! first write, so a rejected invocation leaves the store untouched.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::{dispatch, invoke, Request, Response};

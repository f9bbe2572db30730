//! # Domain Errors
//!
//! Error taxonomy for ledger operations.
//!
//! All validations in an operation run before its first write; the first
//! failure aborts the operation with zero partial writes. Errors surface
//! verbatim to the caller; the enclosing host transaction rolls back in full.

use crate::ports::StoreError;
use thiserror::Error;

/// Errors that a ledger operation can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed input: wrong arity, empty required field, non-numeric
    /// price/period, identical counterparties, unknown operation or status.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A prefix scan returned 0 or >1 records where exactly one is required.
    #[error("expected exactly one {entity} record for {attrs:?}, found {found}")]
    CardinalityMismatch {
        entity: &'static str,
        attrs: Vec<String>,
        found: usize,
    },

    /// The entity's current status forbids the requested transition, or the
    /// asset is already encumbered by another open transfer.
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    /// A reserved account was used where policy forbids it.
    #[error("policy violation for account {account}: {reason}")]
    PolicyViolation { account: String, reason: String },

    /// Buyer cannot cover the listing price.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    /// A stored record failed to decode. Implies store corruption; fatal.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Propagated store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LedgerError::InvalidState`].
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LedgerError::Serialization`].
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

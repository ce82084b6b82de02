//! # Error Types
//!
//! All error types for the supply chain ledger.
//!
//! Display strings for guard failures reproduce the revert reasons callers
//! already match on (`Only Farmer allowed`, `Item must be harvested`).

use crate::domain::value_objects::{Amount, Identity, ItemState, Operation, Requirement, Upc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors returned by ledger operations.
///
/// Every variant is terminal for the call that produced it and leaves the
/// ledger exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Role or registry check failed.
    #[error("Only {required} allowed")]
    Unauthorized {
        /// Operation attempted.
        operation: Operation,
        /// Identity that attempted it.
        caller: Identity,
        /// What the caller would have needed to be.
        required: Requirement,
    },

    /// Current state does not match the operation's precondition.
    #[error("Item must be {}", .expected.phrase())]
    InvalidState {
        /// Operation attempted.
        operation: Operation,
        /// Item concerned.
        upc: Upc,
        /// State the operation requires.
        expected: ItemState,
        /// State the item is in.
        actual: ItemState,
    },

    /// Attached payment is below the listing price.
    #[error("Insufficient payment: required {required}, attached {attached}")]
    InsufficientFunds {
        /// Item concerned.
        upc: Upc,
        /// Listing price.
        required: Amount,
        /// Payment attached to the call.
        attached: Amount,
    },

    /// No record for this UPC.
    #[error("Unknown item: upc {0}")]
    UnknownItem(Upc),

    /// Harvest with a UPC that is already in use.
    #[error("Item already exists: upc {0}")]
    DuplicateItem(Upc),

    /// The empty identity cannot act or hold a role.
    #[error("Invalid identity: the empty identity cannot participate")]
    InvalidIdentity,

    /// The funds sink refused the settlement; the transition was rolled back.
    #[error("Settlement failed: {0}")]
    Settlement(#[from] FundsError),

    /// A mutating call re-entered an item while its settlement was in flight
    /// and the state guard did not already reject it.
    #[error("Reentrant call on upc {0} during settlement")]
    ReentrantCall(Upc),

    /// A post-transition invariant failed; the transition was not committed.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Stable classification for metrics and wire responses.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::UnknownItem(_) => ErrorKind::UnknownItem,
            Self::DuplicateItem(_) => ErrorKind::DuplicateItem,
            Self::InvalidIdentity => ErrorKind::InvalidIdentity,
            Self::Settlement(_) => ErrorKind::SettlementFailed,
            Self::ReentrantCall(_) => ErrorKind::Reentrancy,
            Self::InvariantViolation(_) => ErrorKind::Internal,
        }
    }
}

/// Classification of [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Role/registry check failed.
    Unauthorized,
    /// State precondition failed.
    InvalidState,
    /// Payment below price.
    InsufficientFunds,
    /// UPC not found.
    UnknownItem,
    /// UPC already used.
    DuplicateItem,
    /// Empty identity.
    InvalidIdentity,
    /// Funds sink refused.
    SettlementFailed,
    /// Re-entered during settlement.
    Reentrancy,
    /// Invariant failure.
    Internal,
}

impl ErrorKind {
    /// Label used in metrics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::InvalidState => "InvalidState",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::UnknownItem => "UnknownItem",
            Self::DuplicateItem => "DuplicateItem",
            Self::InvalidIdentity => "InvalidIdentity",
            Self::SettlementFailed => "SettlementFailed",
            Self::Reentrancy => "Reentrancy",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FUNDS ERRORS
// =============================================================================

/// Errors from the funds-transfer sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FundsError {
    /// Payer cannot cover the attached payment.
    #[error("insufficient balance: {account} has {available}, needs {required}")]
    InsufficientBalance {
        /// Account debited.
        account: Identity,
        /// Amount needed.
        required: Amount,
        /// Amount held.
        available: Amount,
    },

    /// Crediting would overflow the account.
    #[error("balance overflow for {0}")]
    Overflow(Identity),

    /// Sink is not accepting transfers.
    #[error("funds sink unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TESTS
// =============================================================================

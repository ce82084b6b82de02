//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the ledger depends on. The identity provider needs no port:
//! callers arrive already authenticated as an [`Identity`].

use crate::domain::settlement::SettlementPlan;
use crate::domain::value_objects::{Amount, Identity};
use crate::errors::FundsError;

// =============================================================================
// FUNDS TRANSFER
// =============================================================================

/// Sink that performs the actual funds movement of a settlement.
///
/// ## Implementation Notes
///
/// `settle` must be all or nothing: debit `attached` from the payer, credit
/// `price` to the recipient and `refund` to the payer, or change nothing and
/// return an error. The ledger rolls the item back on any error.
///
/// The ledger has already recorded the new state when `settle` runs, so an
/// implementation that calls back into the ledger sees the post-transition
/// record.
pub trait FundsTransfer: Send + Sync {
    /// Apply a settlement plan atomically.
    ///
    /// # Errors
    ///
    /// Any [`FundsError`]; no balance may have changed.
    fn settle(&self, plan: &SettlementPlan) -> Result<(), FundsError>;

    /// Current balance of an account.
    fn balance_of(&self, account: &Identity) -> Amount;
}

//! # Escrow Settlement
//!
//! Pure computation of a settlement: who receives the price, how much is
//! refunded. Moving the funds is the job of the [`FundsTransfer`] port.
//!
//! [`FundsTransfer`]: crate::ports::outbound::FundsTransfer

use crate::domain::value_objects::{Amount, Identity, Upc};
use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};

/// A validated settlement, ready to hand to the funds sink.
///
/// `price + refund == attached` always holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Item changing hands.
    pub upc: Upc,
    /// New owner, debited `attached`.
    pub payer: Identity,
    /// Owner before the transition, credited `price`.
    pub recipient: Identity,
    /// Payment attached to the call.
    pub attached: Amount,
    /// Listing price.
    pub price: Amount,
    /// `attached - price`, credited back to the payer.
    pub refund: Amount,
}

impl SettlementPlan {
    /// True when the payer overpaid.
    #[must_use]
    pub fn has_refund(&self) -> bool {
        !self.refund.is_zero()
    }

    /// Receipt for a plan the sink has applied.
    #[must_use]
    pub fn receipt(&self) -> SettlementReceipt {
        SettlementReceipt {
            recipient: self.recipient,
            price: self.price,
            refund: self.refund,
        }
    }
}

/// Funds movement reported back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Previous owner.
    pub recipient: Identity,
    /// Amount forwarded.
    pub price: Amount,
    /// Amount returned to the payer.
    pub refund: Amount,
}

/// Validate payment sufficiency and split the attachment.
///
/// # Errors
///
/// `InsufficientFunds` when `attached < price`.
pub fn plan_settlement(
    upc: Upc,
    payer: Identity,
    recipient: Identity,
    price: Amount,
    attached: Amount,
) -> Result<SettlementPlan, LedgerError> {
    let refund = attached
        .checked_sub(price)
        .ok_or(LedgerError::InsufficientFunds {
            upc,
            required: price,
            attached,
        })?;

    Ok(SettlementPlan {
        upc,
        payer,
        recipient,
        attached,
        price,
        refund,
    })
}

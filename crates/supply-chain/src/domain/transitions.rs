//! # Transition Table
//!
//! Guards and effects for every lifecycle operation after harvest.
//!
//! Authorization keeps its two mechanisms apart: farmer and assigned
//! distributor are equality checks against the record, distributor, retailer
//! and (optionally) consumer are role-set lookups.

use crate::domain::entities::Item;
use crate::domain::roles::RoleRegistry;
use crate::domain::value_objects::{
    Amount, ConsumerPolicy, EventKind, Identity, ItemState, Operation, Requirement, RoleKind,
};
use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};

// =============================================================================
// TRANSITION INTENTS
// =============================================================================

/// A lifecycle step requested against an existing record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// `processItem`
    Process,
    /// `packItem`
    Pack,
    /// `sellItem(price)`
    Sell {
        /// Listing price.
        price: Amount,
    },
    /// `buyItem` with attached payment.
    Buy {
        /// Attached payment.
        payment: Amount,
    },
    /// `shipItem`
    Ship,
    /// `receiveItem`
    Receive,
    /// `purchaseItem` with attached payment.
    Purchase {
        /// Attached payment.
        payment: Amount,
    },
}

impl Transition {
    /// Operation this intent maps to.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Process => Operation::ProcessItem,
            Self::Pack => Operation::PackItem,
            Self::Sell { .. } => Operation::SellItem,
            Self::Buy { .. } => Operation::BuyItem,
            Self::Ship => Operation::ShipItem,
            Self::Receive => Operation::ReceiveItem,
            Self::Purchase { .. } => Operation::PurchaseItem,
        }
    }

    /// Attached payment, for paid operations.
    #[must_use]
    pub const fn payment(&self) -> Option<Amount> {
        match self {
            Self::Buy { payment } | Self::Purchase { payment } => Some(*payment),
            _ => None,
        }
    }
}

/// What an applied transition produced, before it is sequenced in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedTransition {
    /// Event kind to log.
    pub kind: EventKind,
    /// State entered.
    pub state: ItemState,
    /// Price involved, if any.
    pub amount: Option<Amount>,
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// Who may perform `operation` under `policy`.
#[must_use]
pub fn requirement(operation: Operation, policy: ConsumerPolicy) -> Requirement {
    match operation {
        Operation::HarvestItem => Requirement::Anyone,
        Operation::ProcessItem | Operation::PackItem | Operation::SellItem => {
            Requirement::OriginFarmer
        }
        Operation::BuyItem => Requirement::Member(RoleKind::Distributor),
        Operation::ShipItem => Requirement::AssignedDistributor,
        Operation::ReceiveItem => Requirement::Member(RoleKind::Retailer),
        Operation::PurchaseItem => match policy {
            ConsumerPolicy::Open => Requirement::Anyone,
            ConsumerPolicy::Registered => Requirement::Member(RoleKind::Consumer),
        },
        Operation::AddRole(_) | Operation::TransferAdmin => Requirement::Admin,
        Operation::RenounceRole(role) => Requirement::Member(role),
    }
}

/// True if `caller` satisfies `requirement` for this record.
#[must_use]
pub fn is_satisfied(
    requirement: Requirement,
    caller: &Identity,
    item: &Item,
    registry: &RoleRegistry,
) -> bool {
    if caller.is_zero() {
        return false;
    }
    match requirement {
        Requirement::Anyone => true,
        Requirement::OriginFarmer => item.origin_farmer_id == *caller,
        Requirement::AssignedDistributor => item.distributor_id.as_ref() == Some(caller),
        Requirement::Member(role) => registry.has_role(role, caller),
        Requirement::Admin => registry.is_admin(caller),
    }
}

/// Role guard.
///
/// # Errors
///
/// `Unauthorized` naming the requirement that failed.
pub fn authorize(
    operation: Operation,
    caller: Identity,
    item: &Item,
    registry: &RoleRegistry,
    policy: ConsumerPolicy,
) -> Result<(), LedgerError> {
    let required = requirement(operation, policy);
    if is_satisfied(required, &caller, item, registry) {
        Ok(())
    } else {
        Err(LedgerError::Unauthorized {
            operation,
            caller,
            required,
        })
    }
}

// =============================================================================
// STATE GUARD
// =============================================================================

/// State guard. A repeated call fails exactly like a call in any other wrong
/// state.
///
/// # Errors
///
/// `InvalidState` when the record is not in the operation's precondition.
pub fn check_state(operation: Operation, item: &Item) -> Result<(), LedgerError> {
    match operation.required_state() {
        Some(expected) if expected != item.state => Err(LedgerError::InvalidState {
            operation,
            upc: item.upc,
            expected,
            actual: item.state,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// EFFECTS
// =============================================================================

/// Apply the effect row of the transition table. Guards must already have
/// passed.
pub fn apply_transition(
    item: &mut Item,
    transition: &Transition,
    caller: Identity,
) -> AppliedTransition {
    let amount = match *transition {
        Transition::Process | Transition::Pack | Transition::Ship => None,
        Transition::Sell { price } => {
            item.product_price = price;
            Some(price)
        }
        Transition::Buy { .. } => {
            item.owner_id = caller;
            item.distributor_id = Some(caller);
            Some(item.product_price)
        }
        Transition::Receive => {
            item.owner_id = caller;
            item.retailer_id = Some(caller);
            None
        }
        Transition::Purchase { .. } => {
            item.owner_id = caller;
            item.consumer_id = Some(caller);
            Some(item.product_price)
        }
    };

    // Every transition advances the ordinal by exactly one
    let state = transition
        .operation()
        .resulting_state()
        .unwrap_or(item.state);
    item.state = state;

    AppliedTransition {
        kind: EventKind::entering(state),
        state,
        amount,
    }
}

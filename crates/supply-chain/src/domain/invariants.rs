//! # Domain Invariants
//!
//! Properties every committed record must satisfy. The ledger checks them
//! after applying a transition and before anything becomes visible; a
//! failure rolls the record back.
//!
//! - Ordinal advances by exactly one per transition
//! - `ownerID` is the party the current state grants custody to
//! - Downstream parties are assigned once, in order, never reassigned
//! - Provenance and `sku`/`upc` never change after harvest
//! - Price changes only when listing

use crate::domain::entities::Item;
use crate::domain::settlement::SettlementPlan;
use crate::domain::value_objects::{Identity, ItemState};
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// The state ordinal advanced by exactly one.
#[must_use]
pub fn check_ordinal_invariant(before: &Item, after: &Item) -> bool {
    u16::from(after.state.ordinal()) == u16::from(before.state.ordinal()) + 1
}

/// Custodian for the record's state.
///
/// `None` when the party that should hold custody was never assigned.
#[must_use]
pub fn expected_owner(item: &Item) -> Option<Identity> {
    match item.state {
        ItemState::Harvested | ItemState::Processed | ItemState::Packed | ItemState::ForSale => {
            Some(item.origin_farmer_id)
        }
        ItemState::Sold | ItemState::Shipped => item.distributor_id,
        ItemState::Received => item.retailer_id,
        ItemState::Purchased => item.consumer_id,
    }
}

/// `ownerID` equals the party the current state grants custody to.
#[must_use]
pub fn check_custody_invariant(item: &Item) -> bool {
    expected_owner(item) == Some(item.owner_id)
}

/// Downstream parties are present exactly from the state that assigns them.
#[must_use]
pub fn check_assignment_invariant(item: &Item) -> bool {
    let state = item.state;
    item.distributor_id.is_some() == (state >= ItemState::Sold)
        && item.retailer_id.is_some() == (state >= ItemState::Received)
        && item.consumer_id.is_some() == (state >= ItemState::Purchased)
}

/// Assigned parties are never reassigned.
#[must_use]
pub fn check_no_reassignment_invariant(before: &Item, after: &Item) -> bool {
    let kept = |old: Option<Identity>, new: Option<Identity>| old.is_none() || old == new;
    kept(before.distributor_id, after.distributor_id)
        && kept(before.retailer_id, after.retailer_id)
        && kept(before.consumer_id, after.consumer_id)
}

/// Fields fixed at harvest are unchanged.
#[must_use]
pub fn check_provenance_invariant(before: &Item, after: &Item) -> bool {
    before.sku == after.sku
        && before.upc == after.upc
        && before.origin_farmer_id == after.origin_farmer_id
        && before.origin_farm_name == after.origin_farm_name
        && before.origin_farm_information == after.origin_farm_information
        && before.origin_farm_latitude == after.origin_farm_latitude
        && before.origin_farm_longitude == after.origin_farm_longitude
        && before.product_notes == after.product_notes
        && before.image_reference == after.image_reference
}

/// Price changes only on the transition into `ForSale`.
#[must_use]
pub fn check_price_invariant(before: &Item, after: &Item) -> bool {
    before.product_price == after.product_price || after.state == ItemState::ForSale
}

/// `price + refund == attached`.
#[must_use]
pub fn check_settlement_invariant(plan: &SettlementPlan) -> bool {
    plan.price
        .checked_add(plan.refund)
        .is_some_and(|total| total == plan.attached)
}

/// Check a freshly harvested record.
#[must_use]
pub fn check_harvest_invariants(item: &Item) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if item.state != ItemState::Harvested {
        violations.push(InvariantViolation::OrdinalSkipped {
            from: None,
            to: item.state,
        });
    }
    if !check_custody_invariant(item) {
        violations.push(InvariantViolation::WrongCustodian { state: item.state });
    }
    if !check_assignment_invariant(item) {
        violations.push(InvariantViolation::PartyAssignment { state: item.state });
    }

    InvariantCheckResult::from_violations(violations)
}

/// Check all invariants across one transition.
#[must_use]
pub fn check_all_invariants(before: &Item, after: &Item) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_ordinal_invariant(before, after) {
        violations.push(InvariantViolation::OrdinalSkipped {
            from: Some(before.state),
            to: after.state,
        });
    }
    if !check_custody_invariant(after) {
        violations.push(InvariantViolation::WrongCustodian { state: after.state });
    }
    if !check_assignment_invariant(after) || !check_no_reassignment_invariant(before, after) {
        violations.push(InvariantViolation::PartyAssignment { state: after.state });
    }
    if !check_provenance_invariant(before, after) {
        violations.push(InvariantViolation::ProvenanceChanged);
    }
    if !check_price_invariant(before, after) {
        violations.push(InvariantViolation::PriceChanged { state: after.state });
    }

    InvariantCheckResult::from_violations(violations)
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        if violations.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(violations)
        }
    }

    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// State did not advance by exactly one.
    OrdinalSkipped {
        from: Option<ItemState>,
        to: ItemState,
    },
    /// `ownerID` is not the party the state grants custody to.
    WrongCustodian { state: ItemState },
    /// A downstream party is missing, early, or reassigned.
    PartyAssignment { state: ItemState },
    /// A harvest-time field changed.
    ProvenanceChanged,
    /// Price changed outside of listing.
    PriceChanged { state: ItemState },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrdinalSkipped { from: Some(from), to } => {
                write!(f, "state skipped: {from} -> {to}")
            }
            Self::OrdinalSkipped { from: None, to } => {
                write!(f, "new record starts in {to}")
            }
            Self::WrongCustodian { state } => {
                write!(f, "owner does not match custodian for {state}")
            }
            Self::PartyAssignment { state } => {
                write!(f, "party assignment inconsistent with {state}")
            }
            Self::ProvenanceChanged => write!(f, "provenance changed after harvest"),
            Self::PriceChanged { state } => write!(f, "price changed entering {state}"),
        }
    }
}

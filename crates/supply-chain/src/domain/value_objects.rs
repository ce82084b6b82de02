//! # Value Objects
//!
//! Immutable types describing what a caller asks the ledger to do and who
//! may do it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use shared_types::entities::{
    milli_units, units, Amount, EventKind, Identity, ItemState, ProductId, RoleKind, Sku,
    TransitionEvent, Upc, U256,
};

// =============================================================================
// OPERATIONS
// =============================================================================

/// Every mutating entry point of the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Create a record; the caller becomes the farmer.
    HarvestItem,
    /// Farmer processes a harvested item.
    ProcessItem,
    /// Farmer packs a processed item.
    PackItem,
    /// Farmer lists a packed item at a price.
    SellItem,
    /// Distributor buys an item for sale.
    BuyItem,
    /// Assigned distributor ships a sold item.
    ShipItem,
    /// Retailer receives a shipped item.
    ReceiveItem,
    /// Consumer purchases a received item.
    PurchaseItem,
    /// Admin adds an identity to a role set.
    AddRole(RoleKind),
    /// A member removes itself from a role set.
    RenounceRole(RoleKind),
    /// Admin hands over the administrative identity.
    TransferAdmin,
}

impl Operation {
    /// The item lifecycle operations, in chain order.
    pub const LIFECYCLE: [Operation; 8] = [
        Self::HarvestItem,
        Self::ProcessItem,
        Self::PackItem,
        Self::SellItem,
        Self::BuyItem,
        Self::ShipItem,
        Self::ReceiveItem,
        Self::PurchaseItem,
    ];

    /// Name used in logs and metric labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HarvestItem => "harvestItem",
            Self::ProcessItem => "processItem",
            Self::PackItem => "packItem",
            Self::SellItem => "sellItem",
            Self::BuyItem => "buyItem",
            Self::ShipItem => "shipItem",
            Self::ReceiveItem => "receiveItem",
            Self::PurchaseItem => "purchaseItem",
            Self::AddRole(RoleKind::Distributor) => "addDistributor",
            Self::AddRole(RoleKind::Retailer) => "addRetailer",
            Self::AddRole(RoleKind::Consumer) => "addConsumer",
            Self::RenounceRole(RoleKind::Distributor) => "renounceDistributor",
            Self::RenounceRole(RoleKind::Retailer) => "renounceRetailer",
            Self::RenounceRole(RoleKind::Consumer) => "renounceConsumer",
            Self::TransferAdmin => "transferAdmin",
        }
    }

    /// State an existing record must be in. `None` for harvest and the
    /// registry operations.
    #[must_use]
    pub const fn required_state(self) -> Option<ItemState> {
        match self {
            Self::ProcessItem => Some(ItemState::Harvested),
            Self::PackItem => Some(ItemState::Processed),
            Self::SellItem => Some(ItemState::Packed),
            Self::BuyItem => Some(ItemState::ForSale),
            Self::ShipItem => Some(ItemState::Sold),
            Self::ReceiveItem => Some(ItemState::Shipped),
            Self::PurchaseItem => Some(ItemState::Received),
            Self::HarvestItem
            | Self::AddRole(_)
            | Self::RenounceRole(_)
            | Self::TransferAdmin => None,
        }
    }

    /// State the record is in after the operation commits.
    #[must_use]
    pub const fn resulting_state(self) -> Option<ItemState> {
        match self {
            Self::HarvestItem => Some(ItemState::Harvested),
            Self::ProcessItem => Some(ItemState::Processed),
            Self::PackItem => Some(ItemState::Packed),
            Self::SellItem => Some(ItemState::ForSale),
            Self::BuyItem => Some(ItemState::Sold),
            Self::ShipItem => Some(ItemState::Shipped),
            Self::ReceiveItem => Some(ItemState::Received),
            Self::PurchaseItem => Some(ItemState::Purchased),
            Self::AddRole(_) | Self::RenounceRole(_) | Self::TransferAdmin => None,
        }
    }

    /// True for the two operations that collect a payment.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::BuyItem | Self::PurchaseItem)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// AUTHORIZATION REQUIREMENTS
// =============================================================================

/// Who may perform an operation.
///
/// Structural requirements compare the caller against a field of the record;
/// membership requirements look the caller up in the role registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    /// Any non-empty identity.
    Anyone,
    /// Caller must equal `originFarmerID`.
    OriginFarmer,
    /// Caller must equal the assigned `distributorID`.
    AssignedDistributor,
    /// Caller must be in the role set.
    Member(RoleKind),
    /// Caller must be the administrative identity.
    Admin,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anyone => f.write_str("Anyone"),
            Self::OriginFarmer => f.write_str("Farmer"),
            Self::AssignedDistributor => f.write_str("Distributor"),
            Self::Member(role) => write!(f, "{role}"),
            Self::Admin => f.write_str("Owner"),
        }
    }
}

// =============================================================================
// CONSUMER POLICY
// =============================================================================

/// Gating of `purchaseItem`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerPolicy {
    /// Anyone may purchase a received item.
    #[default]
    Open,
    /// Only members of the Consumer set may purchase.
    Registered,
}

impl FromStr for ConsumerPolicy {
    type Err = shared_types::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "registered" => Ok(Self::Registered),
            other => Err(shared_types::ParseError::UnknownValue(other.to_string())),
        }
    }
}

impl fmt::Display for ConsumerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Registered => "registered",
        })
    }
}

//! # Command Schema
//!
//! Wire payloads for driving the ledger through [`SupplyChainService`].
//!
//! - **Caller Identity:** carried by the envelope only, never by a payload
//! - **Correlation IDs:** every response echoes the request's `correlation_id`
//! - **Amounts:** `0x`-prefixed hex quantities in base units
//!
//! [`SupplyChainService`]: crate::service::SupplyChainService

use crate::domain::entities::{
    HarvestDetails, ItemBufferOne, ItemBufferTwo, ItemSnapshot, TransitionReceipt,
};
use crate::domain::transitions::Transition;
use crate::domain::value_objects::{Amount, Identity, Operation, RoleKind, TransitionEvent, Upc};
use crate::errors::{ErrorKind, LedgerError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// INBOUND
// =============================================================================

/// An authenticated command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    /// Echoed in the response.
    #[serde(default = "Uuid::new_v4")]
    pub correlation_id: Uuid,
    /// Identity supplied by the identity provider.
    pub caller: Identity,
    /// What to do.
    pub command: LedgerCommand,
}

impl CommandEnvelope {
    /// Wrap a command with a fresh correlation id.
    #[must_use]
    pub fn new(caller: Identity, command: LedgerCommand) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            caller,
            command,
        }
    }
}

/// Every ledger operation and query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum LedgerCommand {
    // Lifecycle
    HarvestItem { upc: Upc, details: HarvestDetails },
    ProcessItem { upc: Upc },
    PackItem { upc: Upc },
    SellItem { upc: Upc, price: Amount },
    BuyItem { upc: Upc, payment: Amount },
    ShipItem { upc: Upc },
    ReceiveItem { upc: Upc },
    PurchaseItem { upc: Upc, payment: Amount },

    // Queries
    FetchItemBufferOne { upc: Upc },
    FetchItemBufferTwo { upc: Upc },
    FetchItem { upc: Upc },
    History { upc: Upc },
    BalanceOf { account: Identity },

    // Role registry
    AddDistributor { account: Identity },
    AddRetailer { account: Identity },
    AddConsumer { account: Identity },
    RenounceDistributor,
    RenounceRetailer,
    RenounceConsumer,
    IsDistributor { account: Identity },
    IsRetailer { account: Identity },
    IsConsumer { account: Identity },
    TransferAdmin { account: Identity },
}

impl LedgerCommand {
    /// The mutating operation this command performs, `None` for queries.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::HarvestItem { .. } => Some(Operation::HarvestItem),
            Self::AddDistributor { .. } => Some(Operation::AddRole(RoleKind::Distributor)),
            Self::AddRetailer { .. } => Some(Operation::AddRole(RoleKind::Retailer)),
            Self::AddConsumer { .. } => Some(Operation::AddRole(RoleKind::Consumer)),
            Self::RenounceDistributor => Some(Operation::RenounceRole(RoleKind::Distributor)),
            Self::RenounceRetailer => Some(Operation::RenounceRole(RoleKind::Retailer)),
            Self::RenounceConsumer => Some(Operation::RenounceRole(RoleKind::Consumer)),
            Self::TransferAdmin { .. } => Some(Operation::TransferAdmin),
            other => other.transition().map(|(_, t)| t.operation()),
        }
    }

    /// UPC and intent for the post-harvest lifecycle commands.
    #[must_use]
    pub fn transition(&self) -> Option<(Upc, Transition)> {
        match *self {
            Self::ProcessItem { upc } => Some((upc, Transition::Process)),
            Self::PackItem { upc } => Some((upc, Transition::Pack)),
            Self::SellItem { upc, price } => Some((upc, Transition::Sell { price })),
            Self::BuyItem { upc, payment } => Some((upc, Transition::Buy { payment })),
            Self::ShipItem { upc } => Some((upc, Transition::Ship)),
            Self::ReceiveItem { upc } => Some((upc, Transition::Receive)),
            Self::PurchaseItem { upc, payment } => Some((upc, Transition::Purchase { payment })),
            _ => None,
        }
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Response to one [`CommandEnvelope`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// Copied from the request.
    pub correlation_id: Uuid,
    /// Result or rejection.
    pub outcome: CommandOutcome,
}

impl CommandResponse {
    /// True if the command was accepted.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Ok { .. })
    }
}

/// Result or rejection of a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CommandOutcome {
    /// Command accepted.
    Ok {
        /// Payload.
        result: CommandResult,
    },
    /// Command rejected; nothing changed.
    Rejected {
        /// Stable classification.
        kind: ErrorKind,
        /// Human readable reason.
        reason: String,
    },
}

impl From<LedgerError> for CommandOutcome {
    fn from(err: LedgerError) -> Self {
        Self::Rejected {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// Payload of an accepted command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandResult {
    /// Lifecycle operation committed.
    Transition(TransitionReceipt),
    /// `fetchItemBufferOne`
    BufferOne(ItemBufferOne),
    /// `fetchItemBufferTwo`
    BufferTwo(ItemBufferTwo),
    /// `fetchItem`
    Item(ItemSnapshot),
    /// `history`
    History(Vec<TransitionEvent>),
    /// `balanceOf`
    Balance(Amount),
    /// Role grant; `false` when already held.
    RoleGranted(bool),
    /// Role renounced.
    RoleRenounced,
    /// Membership query.
    Membership(bool),
    /// Admin handed over; carries the previous admin.
    AdminTransferred(Identity),
}

//! # Supply Chain Ledger
//!
//! Ledger state machine and escrow settlement engine for coffee lots moving
//! from farmer to distributor to retailer to consumer.
//!
//! ## Purpose
//!
//! Keeps the authoritative record of every lot (keyed by UPC), gates each
//! transition on the caller's role and the lot's current state, and settles
//! payment to the previous owner on the two ownership transfers that carry
//! funds, refunding any overpayment.
//!
//! ## Lifecycle
//!
//! | Operation | Who | From | To |
//! |-----------|-----|------|----|
//! | `harvestItem` | anyone (becomes farmer) | - | Harvested |
//! | `processItem` | origin farmer | Harvested | Processed |
//! | `packItem` | origin farmer | Processed | Packed |
//! | `sellItem(price)` | origin farmer | Packed | ForSale |
//! | `buyItem(payment)` | Distributor set | ForSale | Sold |
//! | `shipItem` | assigned distributor | Sold | Shipped |
//! | `receiveItem` | Retailer set | Shipped | Received |
//! | `purchaseItem(payment)` | anyone, or Consumer set | Received | Purchased |
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Ordinal advances by exactly one | `domain/invariants.rs` - `check_ordinal_invariant()` |
//! | Owner matches custodian for state | `domain/invariants.rs` - `check_custody_invariant()` |
//! | Parties assigned once, never reassigned | `domain/invariants.rs` - `check_no_reassignment_invariant()` |
//! | No partial application | `ledger.rs` - snapshot and rollback around settlement |
//! | State recorded before funds move | `ledger.rs` - `run_transition()` |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `FundsTransfer` | Moves the settled price and refund |
//! | `shared_bus::EventPublisher` | Live tail of the event log |
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use supply_chain::prelude::*;
//!
//! let funds = Arc::new(InMemoryFunds::new());
//! let ledger = SupplyChainLedger::new(LedgerConfig::new(admin), funds);
//!
//! ledger.add_distributor(admin, distributor)?;
//! ledger.harvest_item(farmer, Upc(1), details)?;
//! ledger.process_item(farmer, Upc(1))?;
//! ```
//!
//! ## Features
//!
//! - `metrics`: record Prometheus counters through `ledger-telemetry`

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        HarvestDetails, Item, ItemBufferOne, ItemBufferTwo, ItemSnapshot, TransitionReceipt,
    };

    // Value objects
    pub use crate::domain::value_objects::{
        milli_units, units, Amount, ConsumerPolicy, EventKind, Identity, ItemState, Operation,
        ProductId, Requirement, RoleKind, Sku, TransitionEvent, Upc,
    };

    // Domain services
    pub use crate::domain::roles::RoleRegistry;
    pub use crate::domain::settlement::{plan_settlement, SettlementPlan, SettlementReceipt};
    pub use crate::domain::transitions::{authorize, check_state, Transition};

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{RoleAdminApi, SupplyChainApi};
    pub use crate::ports::outbound::FundsTransfer;

    // Events
    pub use crate::events::{
        CommandEnvelope, CommandOutcome, CommandResponse, CommandResult, LedgerCommand,
    };

    // Errors
    pub use crate::errors::{ErrorKind, FundsError, LedgerError};

    // Adapters
    pub use crate::adapters::{EventLog, InMemoryFunds, ItemStore};

    // Engine and service
    pub use crate::ledger::{LedgerConfig, SupplyChainLedger};
    pub use crate::service::{create_test_service, ServiceStats, SupplyChainService};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================

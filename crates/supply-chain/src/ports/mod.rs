//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the ledger and the outside world.
//!
//! - **Driving Ports (Inbound)**: `SupplyChainApi`, `RoleAdminApi`
//! - **Driven Ports (Outbound)**: `FundsTransfer`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

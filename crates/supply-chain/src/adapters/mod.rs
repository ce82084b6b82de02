//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory storage for records and events, and the in-memory funds ledger
//! implementing the outbound `FundsTransfer` port.

mod event_log;
mod funds;
mod item_store;

pub use event_log::EventLog;
pub use funds::InMemoryFunds;
pub use item_store::{ItemCell, ItemSlot, ItemStore};

//! # Shared Bus
//!
//! Live tail of the supply chain ledger. The ledger's event log is the
//! replayable record; this crate pushes the same committed events to whoever
//! is listening right now (a UI, an auditor, the node's log tail).
//!
//! ```text
//!   SupplyChainLedger ──publish()──▶ InMemoryEventBus ──▶ Subscription (filter)
//!        │                                          └──▶ EventStream  (filter)
//!        └──append()──▶ EventLog (history)
//! ```
//!
//! Rejected operations publish nothing. One item's events arrive in commit
//! order because the ledger publishes while it still holds that item. A
//! listener more than [`DEFAULT_CHANNEL_CAPACITY`] events behind skips the
//! oldest ones instead of stalling the ledger.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Events buffered per listener before it starts skipping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

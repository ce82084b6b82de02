//! # Integration Tests
//!
//! Drive the ledger through its public surfaces and watch the bus.
//!
//! - `flows`: command service and event bus, full lifecycle
//! - `node_protocol`: the node's line protocol over in-memory pipes

pub mod flows;
pub mod node_protocol;

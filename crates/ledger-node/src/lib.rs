//! # Ledger Node Library
//!
//! Configuration and runtime of the `ledger-node` binary, exposed for tests.
//!
//! ## Wire Protocol
//!
//! Input is newline-delimited JSON, one `CommandEnvelope` per line:
//!
//! ```text
//! {"caller":"0x0202...02","command":{"op":"buyItem","upc":1,"payment":"0xde0b6b3a7640000"}}
//! ```
//!
//! Output is one `CommandResponse` per accepted or rejected line, or a
//! `{"line":N,"error":"..."}` object for lines that do not decode.

#![warn(missing_docs)]

pub mod config;
pub mod runtime;

pub use config::{ConfigError, NodeConfig};
pub use runtime::{NodeRuntime, ServeSummary};

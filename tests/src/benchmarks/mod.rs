//! # Ledger Benchmarks
//!
//! Throughput of the transition engine under contention.
//! All benchmarks are "brutal" stress tests.

pub mod ledger;

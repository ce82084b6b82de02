//! # Supply Chain Ledger Benchmarks
//!
//! | Area | Claim | Target |
//! |------|-------|--------|
//! | Full chain | Eight transitions incl. two settlements | < 50µs |
//! | Harvest | Independent of store size | flat |
//! | Guards | Rejection before any mutation | < 1µs |
//! | Contention | Distinct UPCs scale with threads | near-linear |

use criterion::{criterion_group, criterion_main, Criterion};
use ledger_tests::benchmarks::ledger::register_benchmarks;

fn ledger_benches(c: &mut Criterion) {
    register_benchmarks(c);
}

criterion_group!(benches, ledger_benches);
criterion_main!(benches);

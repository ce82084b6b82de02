//! # Transition Engine Brutal Benchmarks
//!
//! Claims to validate:
//! - Per-item locking: unrelated UPCs do not serialize on each other
//! - Guard rejections are cheaper than commits
//! - Settlement adds constant overhead per paid transition
//!
//! Brutal Conditions:
//! - 10,000 tracked items
//! - Full eight-step chains back to back
//! - Many threads hammering one hot UPC

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use supply_chain::prelude::*;

const ADMIN: Identity = Identity::repeat(0xad);
const FARMER: Identity = Identity::repeat(0x01);
const DISTRIBUTOR: Identity = Identity::repeat(0x02);
const RETAILER: Identity = Identity::repeat(0x03);
const CONSUMER: Identity = Identity::repeat(0x04);

fn ledger() -> Arc<SupplyChainLedger> {
    let funds = InMemoryFunds::with_balances([
        (DISTRIBUTOR, units(1_000_000_000)),
        (CONSUMER, units(1_000_000_000)),
    ])
    .unwrap();
    let ledger = SupplyChainLedger::new(LedgerConfig::new(ADMIN), Arc::new(funds));
    ledger.add_distributor(ADMIN, DISTRIBUTOR).unwrap();
    ledger.add_retailer(ADMIN, RETAILER).unwrap();
    Arc::new(ledger)
}

fn full_chain(ledger: &SupplyChainLedger, upc: Upc) {
    ledger
        .harvest_item(FARMER, upc, HarvestDetails::default())
        .unwrap();
    ledger.process_item(FARMER, upc).unwrap();
    ledger.pack_item(FARMER, upc).unwrap();
    ledger.sell_item(FARMER, upc, units(1)).unwrap();
    ledger.buy_item(DISTRIBUTOR, upc, units(2)).unwrap();
    ledger.ship_item(DISTRIBUTOR, upc).unwrap();
    ledger.receive_item(RETAILER, upc).unwrap();
    ledger.purchase_item(CONSUMER, upc, units(1)).unwrap();
}

/// Eight-step chains on fresh UPCs.
pub fn brutal_full_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger-full-chain");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(8));

    let ledger = ledger();
    let mut next = 0u64;
    group.bench_function("harvest_to_purchase", |b| {
        b.iter(|| {
            next += 1;
            full_chain(&ledger, Upc(next));
        })
    });

    group.finish();
}

/// Harvest cost as the store grows.
pub fn brutal_harvest_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger-harvest-scaling");

    for preloaded in [100u64, 1_000, 10_000] {
        let ledger = ledger();
        for upc in 0..preloaded {
            ledger
                .harvest_item(FARMER, Upc(upc), HarvestDetails::default())
                .unwrap();
        }
        let mut next = preloaded;
        group.bench_with_input(
            BenchmarkId::new("harvest", preloaded),
            &preloaded,
            |b, _| {
                b.iter(|| {
                    next += 1;
                    black_box(
                        ledger
                            .harvest_item(FARMER, Upc(next), HarvestDetails::default())
                            .unwrap(),
                    )
                })
            },
        );
    }

    group.finish();
}

/// Rejections at each guard.
pub fn brutal_rejections(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger-rejections");
    let ledger = ledger();
    ledger
        .harvest_item(FARMER, Upc(1), HarvestDetails::default())
        .unwrap();

    group.bench_function("unknown_item", |b| {
        b.iter(|| black_box(ledger.process_item(FARMER, Upc(404)).is_err()))
    });
    group.bench_function("wrong_role", |b| {
        b.iter(|| black_box(ledger.process_item(RETAILER, Upc(1)).is_err()))
    });
    group.bench_function("wrong_state", |b| {
        b.iter(|| black_box(ledger.pack_item(FARMER, Upc(1)).is_err()))
    });

    group.finish();
}

/// Readers on random items while writers advance others.
pub fn brutal_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger-contention");
    group.measurement_time(Duration::from_secs(10));

    for threads in [2usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("parallel_chains", threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let ledger = ledger();
                    std::thread::scope(|s| {
                        for t in 0..threads {
                            let ledger = &ledger;
                            s.spawn(move || {
                                let mut rng = rand::thread_rng();
                                for i in 0..50u64 {
                                    let upc = Upc((t as u64) * 1_000 + i);
                                    full_chain(ledger, upc);
                                    let probe = Upc(rng.gen_range(0..=upc.0));
                                    black_box(ledger.fetch_item(probe).ok());
                                }
                            });
                        }
                    });
                })
            },
        );
    }

    group.finish();
}

/// Register all ledger benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    brutal_full_chain(c);
    brutal_harvest_scaling(c);
    brutal_rejections(c);
    brutal_contention(c);
}

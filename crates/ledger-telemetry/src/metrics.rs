//! Prometheus metrics for the supply chain ledger.
//!
//! All metrics follow the naming convention: `sc_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g. transitions_total)
//! - **Gauge**: Value that can go up or down (e.g. items_tracked)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LEDGER METRICS
    // =========================================================================

    /// Committed transitions, by operation
    pub static ref TRANSITIONS_APPLIED: CounterVec = CounterVec::new(
        Opts::new("sc_ledger_transitions_total", "Total committed item transitions"),
        &["operation"]
    ).expect("metric creation failed");

    /// Rejected operations, by operation and error kind
    pub static ref OPERATIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("sc_ledger_rejections_total", "Total rejected ledger operations"),
        &["operation", "reason"]
    ).expect("metric creation failed");

    /// Items currently tracked by the record store
    pub static ref ITEMS_TRACKED: Gauge = Gauge::new(
        "sc_ledger_items_tracked",
        "Number of items in the record store"
    ).expect("metric creation failed");

    // =========================================================================
    // SETTLEMENT METRICS
    // =========================================================================

    /// Payments forwarded to previous owners
    pub static ref SETTLEMENTS: Counter = Counter::new(
        "sc_ledger_settlements_total",
        "Total escrow settlements committed"
    ).expect("metric creation failed");

    /// Settlements that returned excess payment
    pub static ref REFUNDS: Counter = Counter::new(
        "sc_ledger_refunds_total",
        "Total settlements that refunded an overpayment"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Events observed on the bus by the node's event tail
    pub static ref EVENTS_PUBLISHED: Counter = Counter::new(
        "sc_bus_events_published_total",
        "Total ledger events delivered over the bus"
    ).expect("metric creation failed");
}

/// Handle returned once metrics are registered.
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors registered by this call.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all ledger metrics with the global registry.
///
/// Safe to call more than once; collectors already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Ledger
        Box::new(TRANSITIONS_APPLIED.clone()),
        Box::new(OPERATIONS_REJECTED.clone()),
        Box::new(ITEMS_TRACKED.clone()),
        // Settlement
        Box::new(SETTLEMENTS.clone()),
        Box::new(REFUNDS.clone()),
        // Event Bus
        Box::new(EVENTS_PUBLISHED.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

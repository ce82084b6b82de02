//! # Ledger Telemetry
//!
//! Structured logs (`tracing-subscriber`, text or JSON lines) and Prometheus
//! counters for the supply chain ledger. A binary calls [`init_telemetry`]
//! once and keeps the returned [`TelemetryGuard`] alive until exit:
//!
//! ```rust,ignore
//! let _telemetry = ledger_telemetry::init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! Libraries never install anything; they emit through `tracing` and bump
//! counters with [`metric_inc!`]. Settings come from `SC_SERVICE_NAME`,
//! `SC_LOG_LEVEL`, `SC_JSON_LOGS`, `SC_CONSOLE_OUTPUT` and `SC_METRICS`; see
//! [`TelemetryConfig::from_lookup`].

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, StructuredLogger};
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, EVENTS_PUBLISHED, ITEMS_TRACKED,
    OPERATIONS_REJECTED, REFUNDS, SETTLEMENTS, TRANSITIONS_APPLIED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global log subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics (if enabled), then install the log subscriber.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    let logger = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logger: logger,
        _metrics: metrics,
        service_name: config.service_name,
    })
}

/// Logs a shutdown line when dropped.
pub struct TelemetryGuard {
    _logger: StructuredLogger,
    _metrics: Option<MetricsHandle>,
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// `metric_inc!(COUNTER)` or `metric_inc!(VEC, &["label", ...])`.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

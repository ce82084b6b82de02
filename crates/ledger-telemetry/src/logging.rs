//! Structured logging.
//!
//! Installs the global `tracing` subscriber. JSON output carries the same
//! fields as the console output, so log shippers can parse:
//! - `timestamp`, `level`, `target`, `message`
//! - ledger context fields (`upc`, `caller`, `operation`, `state`)

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::EnvFilter;

/// Structured logger handle
pub struct StructuredLogger {
    json: bool,
}

impl StructuredLogger {
    /// Whether the installed subscriber writes JSON lines.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Build the level filter from the configured directive, falling back to
/// `info` when the directive does not parse.
pub fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber.
///
/// Logs go to stderr so the node's stdout stays a clean response stream.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    if !config.console_output {
        return Ok(StructuredLogger { json: false });
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );

    Ok(StructuredLogger {
        json: config.json_logs,
    })
}

/// Log an item-related event with standard fields.
#[macro_export]
macro_rules! log_item_event {
    ($level:ident, $msg:expr, $upc:expr, $caller:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            upc = %$upc,
            caller = %$caller,
            $($($field)*,)?
            $msg
        )
    };
}

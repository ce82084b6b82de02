//! # Supply Chain Ledger Node
//!
//! Entry point for the ledger executable.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs to stderr, Prometheus registry)
//! 2. Load configuration from `SC_*` environment variables
//! 3. Wire funds, ledger, event bus and command service
//! 4. Start the event tail
//! 5. Serve stdin until end of input or Ctrl+C

use anyhow::{Context, Result};
use ledger_node::{NodeConfig, NodeRuntime};
use ledger_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};
use tokio::io::BufReader;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env().context("Invalid node configuration")?;
    info!(
        admin = %config.ledger.admin,
        consumer_policy = %config.ledger.consumer_policy,
        "Starting supply chain ledger node v{}",
        supply_chain::VERSION
    );

    let runtime = NodeRuntime::new(config)?;
    let tail = runtime.start();

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        served = runtime.serve(stdin, stdout) => {
            served?;
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping before end of input");
        }
    }

    runtime.shutdown();
    if let Err(e) = tail.await {
        warn!("Event tail did not stop cleanly: {}", e);
    }

    let stats = runtime.service().stats().await;
    info!(
        executed = stats.commands_executed,
        rejected = stats.commands_rejected,
        "Node stopped"
    );
    match gather_metrics() {
        Ok(text) => debug!(metrics = %text, "Final metrics"),
        Err(e) => warn!("Failed to gather metrics: {}", e),
    }
    Ok(())
}

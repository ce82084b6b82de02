//! # Node Runtime
//!
//! Owns the wired ledger and drives it from a line-oriented command stream.
//!
//! ## Startup Sequence
//!
//! 1. Seed the funds sink with genesis balances
//! 2. Build the ledger on a fresh event bus
//! 3. Spawn the event tail (logs every bus event until shutdown)
//! 4. Serve commands: one JSON `CommandEnvelope` per input line, one JSON
//!    `CommandResponse` per output line, in input order

use std::sync::Arc;

use anyhow::{Context, Result};
use ledger_telemetry::{log_item_event, metric_inc, EVENTS_PUBLISHED};
use serde::Serialize;
use shared_bus::{EventFilter, InMemoryEventBus, LedgerEvent};
use supply_chain::prelude::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;

/// Counters for one `serve` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    /// Non-empty input lines.
    pub lines: u64,
    /// Commands accepted by the ledger.
    pub accepted: u64,
    /// Commands rejected by the ledger.
    pub rejected: u64,
    /// Lines that were not a valid envelope.
    pub malformed: u64,
}

/// Written in place of a response when a line cannot be decoded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MalformedLine {
    line: u64,
    error: String,
}

/// The wired ledger node.
pub struct NodeRuntime {
    service: Arc<SupplyChainService>,
    bus: Arc<InMemoryEventBus>,
    funds: Arc<InMemoryFunds>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Wire funds, ledger, bus and service.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let funds = Arc::new(
            InMemoryFunds::with_balances(config.genesis_balances.iter().copied())
                .context("Failed to seed genesis balances")?,
        );
        info!(
            accounts = config.genesis_balances.len(),
            total = %funds.total_supply(),
            "Genesis balances loaded"
        );

        let (ledger, bus) = SupplyChainLedger::with_event_bus(config.ledger, funds.clone());
        let service = Arc::new(SupplyChainService::new(Arc::new(ledger)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            service,
            bus,
            funds,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Command service.
    pub fn service(&self) -> &Arc<SupplyChainService> {
        &self.service
    }

    /// Live event bus.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Funds sink.
    pub fn funds(&self) -> &Arc<InMemoryFunds> {
        &self.funds
    }

    /// Spawn the event tail. It runs until `shutdown` is called.
    pub fn start(&self) -> JoinHandle<u64> {
        let mut subscription = self.bus.subscribe(EventFilter::all());
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut seen = 0u64;
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(event) => {
                            seen += 1;
                            log_event(&event);
                        }
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        // Flush what was published before the signal
                        if let Ok(rest) = subscription.drain() {
                            for event in &rest {
                                log_event(event);
                            }
                            seen += rest.len() as u64;
                        }
                        break;
                    }
                }
            }
            info!(events = seen, lagged = subscription.lagged(), "Event tail stopped");
            seen
        })
    }

    /// Serve commands from `reader` until end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<ServeSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut summary = ServeSummary::default();
        let mut line_no = 0u64;

        while let Some(line) = lines.next_line().await.context("Failed to read command")? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            summary.lines += 1;

            let output = match serde_json::from_str::<CommandEnvelope>(line) {
                Ok(envelope) => {
                    let response = self.service.handle(envelope).await;
                    if response.is_ok() {
                        summary.accepted += 1;
                    } else {
                        summary.rejected += 1;
                    }
                    serde_json::to_string(&response)?
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "Malformed command line");
                    summary.malformed += 1;
                    serde_json::to_string(&MalformedLine {
                        line: line_no,
                        error: e.to_string(),
                    })?
                }
            };

            writer.write_all(output.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!(
            lines = summary.lines,
            accepted = summary.accepted,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "Command stream closed"
        );
        Ok(summary)
    }

    /// Signal the event tail to stop.
    pub fn shutdown(&self) {
        info!("Initiating shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            debug!("Event tail already stopped: {}", e);
        }
    }
}

fn log_event(event: &LedgerEvent) {
    metric_inc!(EVENTS_PUBLISHED);
    match event {
        LedgerEvent::ItemTransitioned(e) => log_item_event!(
            info,
            "Item transitioned",
            e.upc,
            e.participant,
            kind = %e.kind,
            sequence = e.sequence
        ),
        LedgerEvent::CriticalError { upc, error } => {
            warn!(upc = ?upc, error = %error, "Critical ledger error");
        }
        other => info!(topic = ?other.topic(), event = ?other, "Ledger event"),
    }
}

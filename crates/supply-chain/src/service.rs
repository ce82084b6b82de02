//! # Supply Chain Service
//!
//! Async command front for the ledger. Takes authenticated
//! [`CommandEnvelope`]s, runs them against the ledger and answers with a
//! [`CommandResponse`] carrying the same correlation id.
//!
//! ## Security
//!
//! - The caller identity comes from the envelope only
//! - Every rejection is reported with its [`ErrorKind`] and leaves the
//!   ledger untouched

use crate::adapters::InMemoryFunds;
use crate::domain::value_objects::Identity;
use crate::errors::{ErrorKind, LedgerError};
use crate::events::{
    CommandEnvelope, CommandOutcome, CommandResponse, CommandResult, LedgerCommand,
};
use crate::ledger::{LedgerConfig, SupplyChainLedger};
use crate::ports::inbound::{RoleAdminApi, SupplyChainApi};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Statistics for the Supply Chain Service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Total commands handled.
    pub commands_executed: u64,
    /// Commands accepted.
    pub commands_succeeded: u64,
    /// Commands rejected.
    pub commands_rejected: u64,
    /// Rejections broken down by kind.
    pub rejections_by_kind: HashMap<ErrorKind, u64>,
    /// Average handling time in microseconds.
    pub avg_handling_time_us: u64,
}

impl ServiceStats {
    fn record(&mut self, outcome: &CommandOutcome, elapsed_us: u64) {
        self.commands_executed += 1;
        match outcome {
            CommandOutcome::Ok { .. } => self.commands_succeeded += 1,
            CommandOutcome::Rejected { kind, .. } => {
                self.commands_rejected += 1;
                *self.rejections_by_kind.entry(*kind).or_insert(0) += 1;
            }
        }
        // Running mean
        let n = self.commands_executed;
        self.avg_handling_time_us = (self.avg_handling_time_us * (n - 1) + elapsed_us) / n;
    }

    /// Rejections of one kind.
    #[must_use]
    pub fn rejected(&self, kind: ErrorKind) -> u64 {
        self.rejections_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// The main Supply Chain Service.
pub struct SupplyChainService {
    ledger: Arc<SupplyChainLedger>,
    stats: Arc<RwLock<ServiceStats>>,
}

impl SupplyChainService {
    /// Create a service over a ledger.
    #[must_use]
    pub fn new(ledger: Arc<SupplyChainLedger>) -> Self {
        Self {
            ledger,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// The underlying ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<SupplyChainLedger> {
        &self.ledger
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Handle one command.
    #[instrument(
        skip(self, envelope),
        fields(correlation_id = %envelope.correlation_id, caller = %envelope.caller)
    )]
    pub async fn handle(&self, envelope: CommandEnvelope) -> CommandResponse {
        let started = Instant::now();
        let CommandEnvelope {
            correlation_id,
            caller,
            command,
        } = envelope;

        let outcome = match self.dispatch(caller, command) {
            Ok(result) => CommandOutcome::Ok { result },
            Err(err) => CommandOutcome::from(err),
        };

        let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.stats.write().await.record(&outcome, elapsed_us);
        debug!(
            accepted = matches!(outcome, CommandOutcome::Ok { .. }),
            elapsed_us,
            "Command handled"
        );

        CommandResponse {
            correlation_id,
            outcome,
        }
    }

    /// Handle commands in order, one at a time.
    pub async fn handle_batch(&self, envelopes: Vec<CommandEnvelope>) -> Vec<CommandResponse> {
        let mut responses = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            responses.push(self.handle(envelope).await);
        }
        responses
    }

    fn dispatch(
        &self,
        caller: Identity,
        command: LedgerCommand,
    ) -> Result<CommandResult, LedgerError> {
        let ledger = self.ledger.as_ref();

        Ok(match command {
            LedgerCommand::HarvestItem { upc, details } => {
                CommandResult::Transition(ledger.harvest_item(caller, upc, details)?)
            }
            LedgerCommand::ProcessItem { upc } => {
                CommandResult::Transition(ledger.process_item(caller, upc)?)
            }
            LedgerCommand::PackItem { upc } => {
                CommandResult::Transition(ledger.pack_item(caller, upc)?)
            }
            LedgerCommand::SellItem { upc, price } => {
                CommandResult::Transition(ledger.sell_item(caller, upc, price)?)
            }
            LedgerCommand::BuyItem { upc, payment } => {
                CommandResult::Transition(ledger.buy_item(caller, upc, payment)?)
            }
            LedgerCommand::ShipItem { upc } => {
                CommandResult::Transition(ledger.ship_item(caller, upc)?)
            }
            LedgerCommand::ReceiveItem { upc } => {
                CommandResult::Transition(ledger.receive_item(caller, upc)?)
            }
            LedgerCommand::PurchaseItem { upc, payment } => {
                CommandResult::Transition(ledger.purchase_item(caller, upc, payment)?)
            }
            LedgerCommand::FetchItemBufferOne { upc } => {
                CommandResult::BufferOne(ledger.fetch_item_buffer_one(upc)?)
            }
            LedgerCommand::FetchItemBufferTwo { upc } => {
                CommandResult::BufferTwo(ledger.fetch_item_buffer_two(upc)?)
            }
            LedgerCommand::FetchItem { upc } => CommandResult::Item(ledger.fetch_item(upc)?),
            LedgerCommand::History { upc } => CommandResult::History(ledger.history(upc)),
            LedgerCommand::BalanceOf { account } => {
                CommandResult::Balance(ledger.balance_of(&account))
            }
            LedgerCommand::AddDistributor { account } => {
                CommandResult::RoleGranted(ledger.add_distributor(caller, account)?)
            }
            LedgerCommand::AddRetailer { account } => {
                CommandResult::RoleGranted(ledger.add_retailer(caller, account)?)
            }
            LedgerCommand::AddConsumer { account } => {
                CommandResult::RoleGranted(ledger.add_consumer(caller, account)?)
            }
            LedgerCommand::RenounceDistributor => {
                ledger.renounce_distributor(caller)?;
                CommandResult::RoleRenounced
            }
            LedgerCommand::RenounceRetailer => {
                ledger.renounce_retailer(caller)?;
                CommandResult::RoleRenounced
            }
            LedgerCommand::RenounceConsumer => {
                ledger.renounce_consumer(caller)?;
                CommandResult::RoleRenounced
            }
            LedgerCommand::IsDistributor { account } => {
                CommandResult::Membership(ledger.is_distributor(&account))
            }
            LedgerCommand::IsRetailer { account } => {
                CommandResult::Membership(ledger.is_retailer(&account))
            }
            LedgerCommand::IsConsumer { account } => {
                CommandResult::Membership(ledger.is_consumer(&account))
            }
            LedgerCommand::TransferAdmin { account } => {
                CommandResult::AdminTransferred(ledger.transfer_admin(caller, account)?)
            }
        })
    }
}

/// Create a service over an in-memory funds ledger (for testing).
#[must_use]
pub fn create_test_service(admin: Identity) -> (SupplyChainService, Arc<InMemoryFunds>) {
    let funds = Arc::new(InMemoryFunds::new());
    let ledger = SupplyChainLedger::new(LedgerConfig::new(admin), funds.clone());
    (SupplyChainService::new(Arc::new(ledger)), funds)
}

// =============================================================================
// TESTS
// =============================================================================

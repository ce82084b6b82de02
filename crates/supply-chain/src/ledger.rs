//! # Ledger Engine
//!
//! Runs one operation at a time per item, start to finish:
//!
//! 1. Resolve the record and enter its critical section
//! 2. Guards: role, state, reentrancy, payment sufficiency
//! 3. Apply the effect and check invariants
//! 4. Settle funds through the [`FundsTransfer`] port (paid operations)
//! 5. Append the event and publish it
//!
//! The record is already in its new state when funds move. A call that
//! re-enters from the funds sink sees that state and is turned away by the
//! ordinary guards. If the sink fails or panics, the record is restored and
//! nothing is logged.

use crate::adapters::{EventLog, ItemSlot, ItemStore};
use crate::domain::entities::{
    HarvestDetails, Item, ItemBufferOne, ItemBufferTwo, ItemSnapshot, TransitionReceipt,
};
use crate::domain::invariants::{
    check_all_invariants, check_harvest_invariants, check_settlement_invariant,
    InvariantCheckResult, InvariantViolation,
};
use crate::domain::roles::RoleRegistry;
use crate::domain::settlement::plan_settlement;
use crate::domain::transitions::{apply_transition, authorize, check_state, Transition};
use crate::domain::value_objects::{
    Amount, ConsumerPolicy, EventKind, Identity, ItemState, Operation, RoleKind,
    TransitionEvent, Upc,
};
use crate::errors::{ErrorKind, LedgerError};
use crate::ports::inbound::{RoleAdminApi, SupplyChainApi};
use crate::ports::outbound::FundsTransfer;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{EventPublisher, InMemoryEventBus, LedgerEvent, DEFAULT_CHANNEL_CAPACITY};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Administrative identity of the role registry.
    pub admin: Identity,
    /// Gating of `purchaseItem`.
    #[serde(default)]
    pub consumer_policy: ConsumerPolicy,
    /// Capacity of the live event bus.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl LedgerConfig {
    /// Configuration with an open consumer policy.
    #[must_use]
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            consumer_policy: ConsumerPolicy::Open,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the consumer policy.
    #[must_use]
    pub fn with_consumer_policy(mut self, policy: ConsumerPolicy) -> Self {
        self.consumer_policy = policy;
        self
    }

    /// Set the event bus capacity.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// The supply chain ledger.
pub struct SupplyChainLedger {
    config: LedgerConfig,
    items: ItemStore,
    registry: RwLock<RoleRegistry>,
    log: EventLog,
    funds: Arc<dyn FundsTransfer>,
}

impl SupplyChainLedger {
    /// Ledger without a live event tail.
    #[must_use]
    pub fn new(config: LedgerConfig, funds: Arc<dyn FundsTransfer>) -> Self {
        Self::build(config, funds, EventLog::new())
    }

    /// Ledger that publishes every event to `publisher`.
    #[must_use]
    pub fn with_publisher(
        config: LedgerConfig,
        funds: Arc<dyn FundsTransfer>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self::build(config, funds, EventLog::with_publisher(publisher))
    }

    /// Ledger wired to a fresh in-memory bus sized from the config.
    #[must_use]
    pub fn with_event_bus(
        config: LedgerConfig,
        funds: Arc<dyn FundsTransfer>,
    ) -> (Self, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_channel_capacity));
        let ledger = Self::with_publisher(config, funds, bus.clone());
        (ledger, bus)
    }

    fn build(config: LedgerConfig, funds: Arc<dyn FundsTransfer>, log: EventLog) -> Self {
        info!(
            admin = %config.admin,
            consumer_policy = %config.consumer_policy,
            "Supply chain ledger initialized"
        );
        Self {
            registry: RwLock::new(RoleRegistry::new(config.admin)),
            config,
            items: ItemStore::new(),
            log,
            funds,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of harvested items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Every event in global append order.
    #[must_use]
    pub fn replay(&self) -> Vec<TransitionEvent> {
        self.log.replay()
    }

    /// Events after `sequence`, for catching up a listener.
    #[must_use]
    pub fn events_since(&self, sequence: u64) -> Vec<TransitionEvent> {
        self.log.since(sequence)
    }

    /// Balance held by the funds sink.
    #[must_use]
    pub fn balance_of(&self, account: &Identity) -> Amount {
        self.funds.balance_of(account)
    }

    // -------------------------------------------------------------------------
    // Harvest
    // -------------------------------------------------------------------------

    fn harvest(
        &self,
        caller: Identity,
        upc: Upc,
        details: HarvestDetails,
    ) -> Result<TransitionReceipt, LedgerError> {
        if caller.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }

        self.items.insert_with(upc, |sku| {
            let item = Item::harvest(sku, upc, caller, details);
            if let InvariantCheckResult::Invalid(violations) = check_harvest_invariants(&item) {
                return Err(invariant_error(&violations));
            }

            let event = self
                .log
                .append(upc, EventKind::Harvested, caller, ItemState::Harvested, None);
            Ok((
                item,
                TransitionReceipt {
                    operation: Operation::HarvestItem,
                    event,
                    settlement: None,
                },
            ))
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle transitions
    // -------------------------------------------------------------------------

    fn run_transition(
        &self,
        caller: Identity,
        upc: Upc,
        transition: &Transition,
    ) -> Result<TransitionReceipt, LedgerError> {
        let operation = transition.operation();
        let cell = self.items.cell(upc)?;
        let slot = cell.lock();

        // Guards: role -> state -> reentrancy -> payment
        let plan = {
            let item = slot.record.borrow();
            authorize(
                operation,
                caller,
                &item,
                &self.registry.read(),
                self.config.consumer_policy,
            )?;
            check_state(operation, &item)?;
            if slot.settling.get() {
                return Err(LedgerError::ReentrantCall(upc));
            }
            match transition.payment() {
                Some(attached) => {
                    let plan =
                        plan_settlement(upc, caller, item.owner_id, item.product_price, attached)?;
                    if !check_settlement_invariant(&plan) {
                        return Err(LedgerError::InvariantViolation(format!(
                            "settlement for {upc} does not balance"
                        )));
                    }
                    Some(plan)
                }
                None => None,
            }
        };

        // Effects: record the new state before any funds move
        let before = slot.record.borrow().clone();
        let applied = {
            let mut item = slot.record.borrow_mut();
            let applied = apply_transition(&mut item, transition, caller);
            if let InvariantCheckResult::Invalid(violations) = check_all_invariants(&before, &item)
            {
                *item = before;
                let err = invariant_error(&violations);
                error!(upc = %upc, operation = %operation, error = %err, "Transition rolled back");
                self.log.publish(LedgerEvent::CriticalError {
                    upc: Some(upc),
                    error: err.to_string(),
                });
                return Err(err);
            }
            applied
        };

        // Interactions
        let settlement = match plan {
            Some(plan) => {
                let guard = SettlementGuard::enter(&slot, before);
                if let Err(funds_err) = self.funds.settle(&plan) {
                    drop(guard);
                    warn!(
                        upc = %upc,
                        operation = %operation,
                        error = %funds_err,
                        "Settlement failed, transition rolled back"
                    );
                    self.log.publish(LedgerEvent::CriticalError {
                        upc: Some(upc),
                        error: funds_err.to_string(),
                    });
                    return Err(LedgerError::Settlement(funds_err));
                }
                guard.commit();
                Some(plan)
            }
            None => None,
        };

        let event = self
            .log
            .append(upc, applied.kind, caller, applied.state, applied.amount);

        if let Some(plan) = &settlement {
            self.log.publish(LedgerEvent::PaymentSettled {
                upc,
                payer: plan.payer,
                recipient: plan.recipient,
                price: plan.price,
                refund: plan.refund,
            });
        }

        Ok(TransitionReceipt {
            operation,
            event,
            settlement: settlement.map(|plan| plan.receipt()),
        })
    }

    fn finish(
        &self,
        operation: Operation,
        caller: Identity,
        upc: Upc,
        result: Result<TransitionReceipt, LedgerError>,
    ) -> Result<TransitionReceipt, LedgerError> {
        match &result {
            Ok(receipt) => {
                info!(
                    upc = %upc,
                    caller = %caller,
                    operation = %operation,
                    state = %receipt.state(),
                    sequence = receipt.event.sequence,
                    "Transition committed"
                );
                if let Some(settlement) = &receipt.settlement {
                    debug!(
                        upc = %upc,
                        recipient = %settlement.recipient,
                        price = %settlement.price,
                        refund = %settlement.refund,
                        "Payment settled"
                    );
                }
            }
            Err(err) => log_rejection(operation, caller, Some(upc), err),
        }

        #[cfg(feature = "metrics")]
        metrics::record_transition(operation, &result, self.items.len());

        result
    }

    fn finish_admin<T>(
        operation: Operation,
        caller: Identity,
        result: Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        if let Err(err) = &result {
            log_rejection(operation, caller, None, err);
            #[cfg(feature = "metrics")]
            metrics::record_rejection(operation, err);
        }
        result
    }
}

/// Marks a record as settling and holds its pre-transition copy.
///
/// Dropped without [`commit`](Self::commit), whether by an early return or
/// by a sink that unwinds, it puts the copy back. Either way the settling
/// flag is cleared, so the record is never left locked out.
struct SettlementGuard<'a> {
    slot: &'a ItemSlot,
    before: Option<Item>,
}

impl<'a> SettlementGuard<'a> {
    fn enter(slot: &'a ItemSlot, before: Item) -> Self {
        slot.settling.set(true);
        Self {
            slot,
            before: Some(before),
        }
    }

    fn commit(mut self) {
        self.before = None;
    }
}

impl Drop for SettlementGuard<'_> {
    fn drop(&mut self) {
        self.slot.settling.set(false);
        let Some(before) = self.before.take() else {
            return;
        };
        let upc = before.upc;
        match self.slot.record.try_borrow_mut() {
            Ok(mut record) => *record = before,
            Err(_) => error!(upc = %upc, "Record still borrowed, rollback skipped"),
        }
        if std::thread::panicking() {
            error!(upc = %upc, "Funds sink panicked, transition rolled back");
        }
    }
}

fn invariant_error(violations: &[InvariantViolation]) -> LedgerError {
    let text = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    LedgerError::InvariantViolation(text)
}

fn log_rejection(operation: Operation, caller: Identity, upc: Option<Upc>, err: &LedgerError) {
    match err.kind() {
        ErrorKind::SettlementFailed | ErrorKind::Reentrancy | ErrorKind::Internal => warn!(
            upc = ?upc,
            caller = %caller,
            operation = %operation,
            reason = %err.kind(),
            error = %err,
            "Operation rejected"
        ),
        _ => debug!(
            upc = ?upc,
            caller = %caller,
            operation = %operation,
            reason = %err.kind(),
            error = %err,
            "Operation rejected"
        ),
    }
}

// =============================================================================
// PORT IMPLEMENTATIONS
// =============================================================================

impl SupplyChainApi for SupplyChainLedger {
    fn harvest_item(
        &self,
        caller: Identity,
        upc: Upc,
        details: HarvestDetails,
    ) -> Result<TransitionReceipt, LedgerError> {
        let result = self.harvest(caller, upc, details);
        self.finish(Operation::HarvestItem, caller, upc, result)
    }

    fn transition(
        &self,
        caller: Identity,
        upc: Upc,
        transition: Transition,
    ) -> Result<TransitionReceipt, LedgerError> {
        let result = self.run_transition(caller, upc, &transition);
        self.finish(transition.operation(), caller, upc, result)
    }

    fn fetch_item_buffer_one(&self, upc: Upc) -> Result<ItemBufferOne, LedgerError> {
        self.items.read(upc, Item::buffer_one)
    }

    fn fetch_item_buffer_two(&self, upc: Upc) -> Result<ItemBufferTwo, LedgerError> {
        self.items.read(upc, Item::buffer_two)
    }

    fn fetch_item(&self, upc: Upc) -> Result<ItemSnapshot, LedgerError> {
        self.items.read(upc, Item::snapshot)
    }

    fn history(&self, upc: Upc) -> Vec<TransitionEvent> {
        self.log.history(upc)
    }
}

impl RoleAdminApi for SupplyChainLedger {
    fn add_role(
        &self,
        caller: Identity,
        role: RoleKind,
        account: Identity,
    ) -> Result<bool, LedgerError> {
        let mut registry = self.registry.write();
        let result = registry.grant(caller, role, account);
        if let Ok(added) = result {
            if added {
                info!(role = %role, account = %account, "Role granted");
                self.log.publish(LedgerEvent::RoleGranted { role, account });
            } else {
                debug!(role = %role, account = %account, "Role already held");
            }
        }
        drop(registry);
        Self::finish_admin(Operation::AddRole(role), caller, result)
    }

    fn renounce_role(&self, caller: Identity, role: RoleKind) -> Result<(), LedgerError> {
        let mut registry = self.registry.write();
        let result = registry.renounce(caller, role);
        if result.is_ok() {
            info!(role = %role, account = %caller, "Role renounced");
            self.log.publish(LedgerEvent::RoleRevoked {
                role,
                account: caller,
            });
        }
        drop(registry);
        Self::finish_admin(Operation::RenounceRole(role), caller, result)
    }

    fn transfer_admin(
        &self,
        caller: Identity,
        new_admin: Identity,
    ) -> Result<Identity, LedgerError> {
        let mut registry = self.registry.write();
        let result = registry.transfer_admin(caller, new_admin);
        if let Ok(previous) = result {
            info!(previous = %previous, current = %new_admin, "Admin transferred");
            self.log.publish(LedgerEvent::AdminTransferred {
                previous,
                current: new_admin,
            });
        }
        drop(registry);
        Self::finish_admin(Operation::TransferAdmin, caller, result)
    }

    fn has_role(&self, role: RoleKind, account: &Identity) -> bool {
        self.registry.read().has_role(role, account)
    }

    fn admin(&self) -> Identity {
        self.registry.read().admin()
    }
}

// =============================================================================
// METRICS
// =============================================================================

#[cfg(feature = "metrics")]
mod metrics {
    use super::{LedgerError, Operation, TransitionReceipt};
    use ledger_telemetry::{
        metric_inc, ITEMS_TRACKED, OPERATIONS_REJECTED, REFUNDS, SETTLEMENTS,
        TRANSITIONS_APPLIED,
    };

    pub(super) fn record_transition(
        operation: Operation,
        result: &Result<TransitionReceipt, LedgerError>,
        items: usize,
    ) {
        match result {
            Ok(receipt) => {
                metric_inc!(TRANSITIONS_APPLIED, &[operation.name()]);
                if let Some(settlement) = &receipt.settlement {
                    metric_inc!(SETTLEMENTS);
                    if !settlement.refund.is_zero() {
                        metric_inc!(REFUNDS);
                    }
                }
                #[allow(clippy::cast_precision_loss)]
                ITEMS_TRACKED.set(items as f64);
            }
            Err(err) => record_rejection(operation, err),
        }
    }

    pub(super) fn record_rejection(operation: Operation, err: &LedgerError) {
        metric_inc!(OPERATIONS_REJECTED, &[operation.name(), err.kind().as_str()]);
    }
}

// =============================================================================
// TESTS
// =============================================================================

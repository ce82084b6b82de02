//! In-Memory Funds Ledger
//!
//! Implements the `FundsTransfer` port as local bookkeeping. Settlement is a
//! single critical section: all balances are computed first and written only
//! if every step succeeds.

use crate::domain::settlement::SettlementPlan;
use crate::domain::value_objects::{Amount, Identity};
use crate::errors::FundsError;
use crate::ports::outbound::FundsTransfer;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Account balances held in memory.
pub struct InMemoryFunds {
    balances: RwLock<HashMap<Identity, Amount>>,
    /// When set, every settlement fails with `Unavailable`.
    fault: AtomicBool,
}

impl InMemoryFunds {
    /// Create an empty funds ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            fault: AtomicBool::new(false),
        }
    }

    /// Create a funds ledger with opening balances.
    ///
    /// # Errors
    ///
    /// `Overflow` if the same account is listed with amounts that overflow.
    pub fn with_balances(
        balances: impl IntoIterator<Item = (Identity, Amount)>,
    ) -> Result<Self, FundsError> {
        let funds = Self::new();
        for (account, amount) in balances {
            funds.deposit(account, amount)?;
        }
        Ok(funds)
    }

    /// Credit an account. Returns the new balance.
    ///
    /// # Errors
    ///
    /// `Overflow` if the balance would not fit.
    pub fn deposit(&self, account: Identity, amount: Amount) -> Result<Amount, FundsError> {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_insert_with(Amount::zero);
        *balance = balance
            .checked_add(amount)
            .ok_or(FundsError::Overflow(account))?;
        debug!(account = %account, amount = %amount, "Deposit");
        Ok(*balance)
    }

    /// Make every settlement fail (or succeed again).
    pub fn set_fault(&self, enabled: bool) {
        self.fault.store(enabled, Ordering::SeqCst);
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.balances
            .read()
            .values()
            .fold(Amount::zero(), |acc, b| acc.saturating_add(*b))
    }
}

impl Default for InMemoryFunds {
    fn default() -> Self {
        Self::new()
    }
}

impl FundsTransfer for InMemoryFunds {
    fn settle(&self, plan: &SettlementPlan) -> Result<(), FundsError> {
        if self.fault.load(Ordering::SeqCst) {
            warn!(upc = %plan.upc, "Funds sink unavailable");
            return Err(FundsError::Unavailable("fault injected".to_string()));
        }

        let mut balances = self.balances.write();

        // Debit the full attachment, then credit the refund back
        let available = balances.get(&plan.payer).copied().unwrap_or_default();
        let payer_after = available
            .checked_sub(plan.attached)
            .ok_or(FundsError::InsufficientBalance {
                account: plan.payer,
                required: plan.attached,
                available,
            })?
            .checked_add(plan.refund)
            .ok_or(FundsError::Overflow(plan.payer))?;

        // Payer and recipient may be the same account
        let recipient_before = if plan.recipient == plan.payer {
            payer_after
        } else {
            balances.get(&plan.recipient).copied().unwrap_or_default()
        };
        let recipient_after = recipient_before
            .checked_add(plan.price)
            .ok_or(FundsError::Overflow(plan.recipient))?;

        balances.insert(plan.payer, payer_after);
        balances.insert(plan.recipient, recipient_after);

        debug!(
            upc = %plan.upc,
            payer = %plan.payer,
            recipient = %plan.recipient,
            price = %plan.price,
            refund = %plan.refund,
            "Settlement applied"
        );
        Ok(())
    }

    fn balance_of(&self, account: &Identity) -> Amount {
        self.balances
            .read()
            .get(account)
            .copied()
            .unwrap_or_default()
    }
}

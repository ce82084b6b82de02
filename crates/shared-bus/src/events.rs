//! # Ledger Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Amount, Identity, RoleKind, TransitionEvent, Upc};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // ITEM LIFECYCLE
    // =========================================================================
    /// A transition was committed and appended to the event log.
    ItemTransitioned(TransitionEvent),

    // =========================================================================
    // ESCROW SETTLEMENT
    // =========================================================================
    /// A payment was forwarded to the previous owner.
    PaymentSettled {
        /// Item that changed hands.
        upc: Upc,
        /// New owner who attached the payment.
        payer: Identity,
        /// Previous owner who received the price.
        recipient: Identity,
        /// Amount forwarded to the recipient.
        price: Amount,
        /// Excess returned to the payer.
        refund: Amount,
    },

    // =========================================================================
    // ROLE REGISTRY
    // =========================================================================
    /// An identity was added to a role set.
    RoleGranted {
        /// Role set.
        role: RoleKind,
        /// Identity added.
        account: Identity,
    },

    /// An identity left a role set.
    RoleRevoked {
        /// Role set.
        role: RoleKind,
        /// Identity removed.
        account: Identity,
    },

    /// The administrative identity changed.
    AdminTransferred {
        /// Outgoing admin.
        previous: Identity,
        /// Incoming admin.
        current: Identity,
    },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Failure requiring operator attention, e.g. a funds sink rollback.
    CriticalError {
        /// Item involved, if any.
        upc: Option<Upc>,
        /// Error description.
        error: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ItemTransitioned(_) => EventTopic::ItemLifecycle,
            Self::PaymentSettled { .. } => EventTopic::Settlement,
            Self::RoleGranted { .. } | Self::RoleRevoked { .. } | Self::AdminTransferred { .. } => {
                EventTopic::RoleRegistry
            }
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// The item this event concerns, if it concerns one.
    #[must_use]
    pub fn upc(&self) -> Option<Upc> {
        match self {
            Self::ItemTransitioned(event) => Some(event.upc),
            Self::PaymentSettled { upc, .. } => Some(*upc),
            Self::CriticalError { upc, .. } => *upc,
            Self::RoleGranted { .. } | Self::RoleRevoked { .. } | Self::AdminTransferred { .. } => {
                None
            }
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Item transitions.
    ItemLifecycle,
    /// Escrow settlements.
    Settlement,
    /// Role registry changes.
    RoleRegistry,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Items to include. Empty means all items; non-empty excludes events
    /// that concern no item.
    pub upcs: Vec<Upc>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            upcs: Vec::new(),
        }
    }

    /// Create a filter for every event about one item.
    #[must_use]
    pub fn for_upc(upc: Upc) -> Self {
        Self {
            topics: Vec::new(),
            upcs: vec![upc],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let upc_match = self.upcs.is_empty()
            || event.upc().is_some_and(|upc| self.upcs.contains(&upc));

        topic_match && upc_match
    }
}

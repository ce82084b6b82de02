//! Event Log
//!
//! Append-only record of committed transitions with a per-UPC index.
//! Each append is published to the bus while the log lock is held, so live
//! subscribers see events in append order.

use crate::domain::value_objects::{Amount, EventKind, Identity, ItemState, TransitionEvent, Upc};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, LedgerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Default)]
struct LogInner {
    entries: Vec<TransitionEvent>,
    by_upc: HashMap<Upc, Vec<usize>>,
}

/// In-memory event log with an optional live tail.
pub struct EventLog {
    inner: Mutex<LogInner>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl EventLog {
    /// Log without a live tail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LogInner::default()),
            publisher: None,
        }
    }

    /// Log that forwards every append to `publisher`.
    #[must_use]
    pub fn with_publisher(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner: Mutex::new(LogInner::default()),
            publisher: Some(publisher),
        }
    }

    /// Append a committed transition. Sequence numbers start at 1.
    pub fn append(
        &self,
        upc: Upc,
        kind: EventKind,
        participant: Identity,
        state: ItemState,
        amount: Option<Amount>,
    ) -> TransitionEvent {
        let mut inner = self.inner.lock();
        let position = inner.entries.len();
        let event = TransitionEvent {
            sequence: position as u64 + 1,
            upc,
            kind,
            participant,
            state,
            amount,
        };

        inner.entries.push(event.clone());
        inner.by_upc.entry(upc).or_default().push(position);

        if let Some(publisher) = &self.publisher {
            publisher.publish(LedgerEvent::ItemTransitioned(event.clone()));
        }
        trace!(upc = %upc, sequence = event.sequence, kind = %kind, "Event appended");

        event
    }

    /// Publish a bus-only event (settlements, registry changes, critical
    /// errors). Nothing is appended.
    pub fn publish(&self, event: LedgerEvent) {
        if let Some(publisher) = &self.publisher {
            // Same lock as `append` keeps bus order consistent with the log
            let _guard = self.inner.lock();
            publisher.publish(event);
        }
    }

    /// Events for one UPC, in transition order.
    #[must_use]
    pub fn history(&self, upc: Upc) -> Vec<TransitionEvent> {
        let inner = self.inner.lock();
        inner
            .by_upc
            .get(&upc)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&p| inner.entries[p].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every event, in global append order.
    #[must_use]
    pub fn replay(&self) -> Vec<TransitionEvent> {
        self.inner.lock().entries.clone()
    }

    /// Events with a sequence number greater than `sequence`.
    #[must_use]
    pub fn since(&self, sequence: u64) -> Vec<TransitionEvent> {
        let inner = self.inner.lock();
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(inner.entries.len());
        inner.entries[start..].to_vec()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True before the first harvest.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

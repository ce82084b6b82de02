//! # Publishing
//!
//! The ledger holds an [`EventPublisher`] and calls it once per committed
//! event. [`InMemoryEventBus`] is the process-local implementation backed by
//! a `tokio` broadcast channel.

use crate::events::{EventFilter, LedgerEvent};
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Sink for committed ledger events.
///
/// `publish` is synchronous so the ledger can call it inside an item's
/// critical section; listeners therefore see one item's events in the order
/// they were committed.
pub trait EventPublisher: Send + Sync {
    /// Hand `event` to every live listener. Returns how many there were.
    fn publish(&self, event: LedgerEvent) -> usize;

    /// Events handed in since construction, listened to or not.
    fn events_published(&self) -> u64;
}

/// Process-local bus.
pub struct InMemoryEventBus {
    tx: broadcast::Sender<LedgerEvent>,
    published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus buffering [`DEFAULT_CHANNEL_CAPACITY`] events per listener.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering `capacity` events per listener. Zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Open a listener. It sees only events published from now on; earlier
    /// history lives in the ledger's event log.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, upcs = ?filter.upcs, "Listener attached");
        Subscription::new(self.tx.subscribe(), filter)
    }

    /// [`subscribe`](Self::subscribe), wrapped as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Listeners currently attached.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: LedgerEvent) -> usize {
        let topic = event.topic();
        let upc = event.upc();
        self.published.fetch_add(1, Ordering::Relaxed);

        // `send` only fails when nobody is listening
        let Ok(listeners) = self.tx.send(event) else {
            trace!(?topic, ?upc, "No listeners");
            return 0;
        };
        debug!(?topic, ?upc, listeners, "Event published");
        listeners
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

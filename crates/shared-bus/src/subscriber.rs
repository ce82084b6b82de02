//! # Listeners
//!
//! A [`Subscription`] is one listener's cursor into the live tail. It sees
//! events published after it was opened, narrowed by its [`EventFilter`].
//! Falling more than the channel capacity behind skips the oldest events;
//! the skipped count is kept so a listener can tell it must re-read the
//! ledger's event log.

use crate::events::{EventFilter, LedgerEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::Stream;
use tracing::{debug, trace};

/// The bus went away.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every publisher handle was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Anything listeners can attach to.
pub trait EventSubscriber: Send + Sync {
    /// Open a listener narrowed by `filter`.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// One listener on the live tail.
pub struct Subscription {
    rx: broadcast::Receiver<LedgerEvent>,
    filter: EventFilter,
    skipped: u64,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<LedgerEvent>, filter: EventFilter) -> Self {
        Self {
            rx,
            filter,
            skipped: 0,
        }
    }

    fn note_skipped(&mut self, count: u64) {
        self.skipped += count;
        debug!(skipped = count, total = self.skipped, "Listener fell behind the tail");
    }

    fn keep(&self, event: LedgerEvent) -> Option<LedgerEvent> {
        if self.filter.matches(&event) {
            Some(event)
        } else {
            trace!(topic = ?event.topic(), "Filtered out");
            None
        }
    }

    /// Wait for the next event this listener cares about.
    ///
    /// `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(event) = self.keep(event) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(count)) => self.note_skipped(count),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered event this listener cares about, without waiting.
    ///
    /// `Ok(None)` when nothing matching is buffered right now.
    pub fn try_recv(&mut self) -> Result<Option<LedgerEvent>, SubscriptionError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(event) = self.keep(event) {
                        return Ok(Some(event));
                    }
                }
                Err(TryRecvError::Lagged(count)) => self.note_skipped(count),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Take everything matching that is already buffered, oldest first.
    pub fn drain(&mut self) -> Result<Vec<LedgerEvent>, SubscriptionError> {
        let mut out = Vec::new();
        while let Some(event) = self.try_recv()? {
            out.push(event);
        }
        Ok(out)
    }

    /// Events lost to lag so far.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.skipped
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// [`Subscription`] as a `Stream`, for use with `StreamExt` combinators.
pub struct EventStream {
    inner: Subscription,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self {
            inner: subscription,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.inner.filter()
    }

    /// Events lost to lag so far.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.inner.lagged()
    }
}

impl Stream for EventStream {
    type Item = LedgerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<LedgerEvent>> {
        match self.inner.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Err(SubscriptionError::Closed) => Poll::Ready(None),
            Ok(None) => {
                // The broadcast receiver has no poll API without tokio-stream's
                // `sync` feature; re-poll on the next scheduler turn.
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

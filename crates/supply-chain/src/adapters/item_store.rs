//! Item Record Store
//!
//! UPC -> record map plus the harvest `sku` counter, both behind one lock so
//! that a UPC and its sku are claimed together.
//!
//! Each record lives in its own [`ItemCell`]: a reentrant lock serializes
//! callers on different threads for the whole of an operation, while a call
//! re-entering from the same thread (a funds sink calling back into the
//! ledger) gets through the lock and meets the normal guards instead.

use crate::domain::entities::Item;
use crate::domain::value_objects::{Sku, Upc};
use crate::errors::LedgerError;
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Record plus its settlement flag.
#[derive(Debug)]
pub struct ItemSlot {
    /// The record.
    pub record: RefCell<Item>,
    /// Set while a settlement for this record is in flight.
    pub settling: Cell<bool>,
}

impl ItemSlot {
    fn new(item: Item) -> Self {
        Self {
            record: RefCell::new(item),
            settling: Cell::new(false),
        }
    }
}

/// Per-item critical section.
pub type ItemCell = ReentrantMutex<ItemSlot>;

struct StoreInner {
    items: HashMap<Upc, Arc<ItemCell>>,
    last_sku: u64,
}

/// In-memory item record store. Records are never removed.
pub struct ItemStore {
    inner: RwLock<StoreInner>,
}

impl ItemStore {
    /// Create an empty store. The first harvest gets sku 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                items: HashMap::new(),
                last_sku: 0,
            }),
        }
    }

    /// Claim `upc` and the next sku, build the record and insert it.
    ///
    /// `build` runs under the store's write lock; if it fails neither the UPC
    /// nor the sku is consumed.
    ///
    /// # Errors
    ///
    /// `DuplicateItem` if the UPC exists, or whatever `build` returns.
    pub fn insert_with<T>(
        &self,
        upc: Upc,
        build: impl FnOnce(Sku) -> Result<(Item, T), LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut inner = self.inner.write();
        if inner.items.contains_key(&upc) {
            return Err(LedgerError::DuplicateItem(upc));
        }

        let sku = Sku(inner.last_sku + 1);
        let (item, output) = build(sku)?;

        inner.last_sku = sku.0;
        inner
            .items
            .insert(upc, Arc::new(ReentrantMutex::new(ItemSlot::new(item))));

        debug!(upc = %upc, sku = %sku, "Item record created");
        Ok(output)
    }

    /// Handle to a record's critical section.
    ///
    /// # Errors
    ///
    /// `UnknownItem`.
    pub fn cell(&self, upc: Upc) -> Result<Arc<ItemCell>, LedgerError> {
        self.inner
            .read()
            .items
            .get(&upc)
            .cloned()
            .ok_or(LedgerError::UnknownItem(upc))
    }

    /// Run `f` on a consistent view of the record.
    ///
    /// # Errors
    ///
    /// `UnknownItem`.
    pub fn read<R>(&self, upc: Upc, f: impl FnOnce(&Item) -> R) -> Result<R, LedgerError> {
        let cell = self.cell(upc)?;
        let slot = cell.lock();
        let item = slot.record.borrow();
        Ok(f(&item))
    }

    /// True if a record exists for `upc`.
    #[must_use]
    pub fn contains(&self, upc: Upc) -> bool {
        self.inner.read().items.contains_key(&upc)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    /// True when no item has been harvested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last sku assigned, zero before the first harvest.
    #[must_use]
    pub fn last_sku(&self) -> Sku {
        Sku(self.inner.read().last_sku)
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

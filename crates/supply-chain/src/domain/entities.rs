//! # Domain Entities
//!
//! The item record and its read-only projections.
//!
//! One normalized record per UPC. The two "buffer" projections exist for
//! interface compatibility with existing front ends and are always cut from
//! the same record.

use crate::domain::settlement::SettlementReceipt;
use crate::domain::value_objects::{
    Amount, Identity, ItemState, Operation, ProductId, Sku, TransitionEvent, Upc,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HARVEST INPUT
// =============================================================================

/// Provenance supplied by the farmer at harvest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestDetails {
    /// Farm name.
    pub farm_name: String,
    /// Free-form farm information.
    pub farm_information: String,
    /// Latitude, as supplied.
    pub latitude: String,
    /// Longitude, as supplied.
    pub longitude: String,
    /// Product notes.
    pub product_notes: String,
    /// Content-store handle of the provenance photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
}

impl HarvestDetails {
    /// Create harvest details without an image reference.
    pub fn new(
        farm_name: impl Into<String>,
        farm_information: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        product_notes: impl Into<String>,
    ) -> Self {
        Self {
            farm_name: farm_name.into(),
            farm_information: farm_information.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            product_notes: product_notes.into(),
            image_reference: None,
        }
    }

    /// Attach a content-store handle.
    #[must_use]
    pub fn with_image(mut self, reference: impl Into<String>) -> Self {
        self.image_reference = Some(reference.into());
        self
    }

    /// Empty image handles mean "no image".
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self
            .image_reference
            .as_deref()
            .is_some_and(|r| r.trim().is_empty())
        {
            self.image_reference = None;
        }
        self
    }
}

// =============================================================================
// ITEM RECORD
// =============================================================================

/// One tracked coffee lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Harvest sequence number.
    pub sku: Sku,
    /// Unique product code.
    pub upc: Upc,
    /// Current custodian.
    #[serde(rename = "ownerID")]
    pub owner_id: Identity,
    /// Harvesting farmer.
    #[serde(rename = "originFarmerID")]
    pub origin_farmer_id: Identity,
    /// Farm name.
    pub origin_farm_name: String,
    /// Farm information.
    pub origin_farm_information: String,
    /// Farm latitude.
    pub origin_farm_latitude: String,
    /// Farm longitude.
    pub origin_farm_longitude: String,
    /// Product notes.
    pub product_notes: String,
    /// Zero until listed.
    pub product_price: Amount,
    /// Lifecycle state.
    pub state: ItemState,
    /// Set by `buyItem`.
    #[serde(rename = "distributorID")]
    pub distributor_id: Option<Identity>,
    /// Set by `receiveItem`.
    #[serde(rename = "retailerID")]
    pub retailer_id: Option<Identity>,
    /// Set by `purchaseItem`.
    #[serde(rename = "consumerID")]
    pub consumer_id: Option<Identity>,
    /// Content-store handle.
    pub image_reference: Option<String>,
}

impl Item {
    /// Build a freshly harvested record owned by `farmer`.
    #[must_use]
    pub fn harvest(sku: Sku, upc: Upc, farmer: Identity, details: HarvestDetails) -> Self {
        let details = details.normalized();
        Self {
            sku,
            upc,
            owner_id: farmer,
            origin_farmer_id: farmer,
            origin_farm_name: details.farm_name,
            origin_farm_information: details.farm_information,
            origin_farm_latitude: details.latitude,
            origin_farm_longitude: details.longitude,
            product_notes: details.product_notes,
            product_price: Amount::zero(),
            state: ItemState::Harvested,
            distributor_id: None,
            retailer_id: None,
            consumer_id: None,
            image_reference: details.image_reference,
        }
    }

    /// `sku + upc`.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        ProductId::derive(self.sku, self.upc)
    }

    /// Custody and provenance projection.
    #[must_use]
    pub fn buffer_one(&self) -> ItemBufferOne {
        ItemBufferOne {
            sku: self.sku,
            upc: self.upc,
            owner_id: self.owner_id,
            origin_farmer_id: self.origin_farmer_id,
            origin_farm_name: self.origin_farm_name.clone(),
            origin_farm_information: self.origin_farm_information.clone(),
            origin_farm_latitude: self.origin_farm_latitude.clone(),
            origin_farm_longitude: self.origin_farm_longitude.clone(),
            image_reference: self.image_reference.clone(),
        }
    }

    /// Commercial projection.
    #[must_use]
    pub fn buffer_two(&self) -> ItemBufferTwo {
        ItemBufferTwo {
            sku: self.sku,
            upc: self.upc,
            product_id: self.product_id(),
            product_notes: self.product_notes.clone(),
            product_price: self.product_price,
            state: self.state,
            distributor_id: self.distributor_id,
            retailer_id: self.retailer_id,
            consumer_id: self.consumer_id,
        }
    }

    /// Both projections of this record.
    #[must_use]
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            buffer_one: self.buffer_one(),
            buffer_two: self.buffer_two(),
        }
    }
}

// =============================================================================
// PROJECTIONS
// =============================================================================

/// "Buffer one": keys, custody and provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ItemBufferOne {
    pub sku: Sku,
    pub upc: Upc,
    #[serde(rename = "ownerID")]
    pub owner_id: Identity,
    #[serde(rename = "originFarmerID")]
    pub origin_farmer_id: Identity,
    pub origin_farm_name: String,
    pub origin_farm_information: String,
    pub origin_farm_latitude: String,
    pub origin_farm_longitude: String,
    pub image_reference: Option<String>,
}

/// "Buffer two": keys, price, state and downstream parties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ItemBufferTwo {
    pub sku: Sku,
    pub upc: Upc,
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    pub product_notes: String,
    pub product_price: Amount,
    pub state: ItemState,
    #[serde(rename = "distributorID")]
    pub distributor_id: Option<Identity>,
    #[serde(rename = "retailerID")]
    pub retailer_id: Option<Identity>,
    #[serde(rename = "consumerID")]
    pub consumer_id: Option<Identity>,
}

/// Both projections taken under one lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ItemSnapshot {
    pub buffer_one: ItemBufferOne,
    pub buffer_two: ItemBufferTwo,
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Result of a committed lifecycle operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReceipt {
    /// Operation that committed.
    pub operation: Operation,
    /// Event appended to the log.
    pub event: TransitionEvent,
    /// Funds movement, for paid operations.
    pub settlement: Option<SettlementReceipt>,
}

impl TransitionReceipt {
    /// State the item is now in.
    #[must_use]
    pub fn state(&self) -> ItemState {
        self.event.state
    }
}

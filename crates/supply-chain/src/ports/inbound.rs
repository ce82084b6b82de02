//! # Driving Ports (API - Inbound)
//!
//! The operation surface offered to callers. Every method takes the
//! authenticated caller identity explicitly.

use crate::domain::entities::{
    HarvestDetails, ItemBufferOne, ItemBufferTwo, ItemSnapshot, TransitionReceipt,
};
use crate::domain::transitions::Transition;
use crate::domain::value_objects::{Amount, Identity, RoleKind, TransitionEvent, Upc};
use crate::errors::LedgerError;

// =============================================================================
// ITEM LIFECYCLE
// =============================================================================

/// Lifecycle operations and read-only queries, per UPC.
pub trait SupplyChainApi: Send + Sync {
    /// Create a record for an unused UPC. The caller becomes the farmer.
    ///
    /// # Errors
    ///
    /// `DuplicateItem` if the UPC is in use, `InvalidIdentity` for the empty
    /// caller.
    fn harvest_item(
        &self,
        caller: Identity,
        upc: Upc,
        details: HarvestDetails,
    ) -> Result<TransitionReceipt, LedgerError>;

    /// Apply one lifecycle step to an existing record.
    ///
    /// # Errors
    ///
    /// `UnknownItem`, `Unauthorized`, `InvalidState`, `ReentrantCall`,
    /// `InsufficientFunds` or `Settlement`, checked in that order.
    fn transition(
        &self,
        caller: Identity,
        upc: Upc,
        transition: Transition,
    ) -> Result<TransitionReceipt, LedgerError>;

    /// Custody and provenance view.
    ///
    /// # Errors
    ///
    /// `UnknownItem`.
    fn fetch_item_buffer_one(&self, upc: Upc) -> Result<ItemBufferOne, LedgerError>;

    /// Price, state and downstream parties view.
    ///
    /// # Errors
    ///
    /// `UnknownItem`.
    fn fetch_item_buffer_two(&self, upc: Upc) -> Result<ItemBufferTwo, LedgerError>;

    /// Both views from one consistent read.
    ///
    /// # Errors
    ///
    /// `UnknownItem`.
    fn fetch_item(&self, upc: Upc) -> Result<ItemSnapshot, LedgerError>;

    /// Events for one UPC, in transition order. Empty for an unknown UPC.
    fn history(&self, upc: Upc) -> Vec<TransitionEvent>;

    /// `processItem`
    fn process_item(&self, caller: Identity, upc: Upc) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Process)
    }

    /// `packItem`
    fn pack_item(&self, caller: Identity, upc: Upc) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Pack)
    }

    /// `sellItem(price)`
    fn sell_item(
        &self,
        caller: Identity,
        upc: Upc,
        price: Amount,
    ) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Sell { price })
    }

    /// `buyItem` with attached payment.
    fn buy_item(
        &self,
        caller: Identity,
        upc: Upc,
        payment: Amount,
    ) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Buy { payment })
    }

    /// `shipItem`
    fn ship_item(&self, caller: Identity, upc: Upc) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Ship)
    }

    /// `receiveItem`
    fn receive_item(&self, caller: Identity, upc: Upc) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Receive)
    }

    /// `purchaseItem` with attached payment.
    fn purchase_item(
        &self,
        caller: Identity,
        upc: Upc,
        payment: Amount,
    ) -> Result<TransitionReceipt, LedgerError> {
        self.transition(caller, upc, Transition::Purchase { payment })
    }
}

// =============================================================================
// ROLE ADMINISTRATION
// =============================================================================

/// Role registry surface.
pub trait RoleAdminApi: Send + Sync {
    /// Add `account` to a role set. Admin only. `false` if already a member.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidIdentity`.
    fn add_role(
        &self,
        caller: Identity,
        role: RoleKind,
        account: Identity,
    ) -> Result<bool, LedgerError>;

    /// Caller leaves a role set.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if not a member.
    fn renounce_role(&self, caller: Identity, role: RoleKind) -> Result<(), LedgerError>;

    /// Hand over administration. Returns the previous admin.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidIdentity`.
    fn transfer_admin(&self, caller: Identity, new_admin: Identity)
        -> Result<Identity, LedgerError>;

    /// Membership lookup.
    fn has_role(&self, role: RoleKind, account: &Identity) -> bool;

    /// Current admin.
    fn admin(&self) -> Identity;

    /// `addDistributor`
    fn add_distributor(&self, caller: Identity, account: Identity) -> Result<bool, LedgerError> {
        self.add_role(caller, RoleKind::Distributor, account)
    }

    /// `addRetailer`
    fn add_retailer(&self, caller: Identity, account: Identity) -> Result<bool, LedgerError> {
        self.add_role(caller, RoleKind::Retailer, account)
    }

    /// `addConsumer`
    fn add_consumer(&self, caller: Identity, account: Identity) -> Result<bool, LedgerError> {
        self.add_role(caller, RoleKind::Consumer, account)
    }

    /// `renounceDistributor`
    fn renounce_distributor(&self, caller: Identity) -> Result<(), LedgerError> {
        self.renounce_role(caller, RoleKind::Distributor)
    }

    /// `renounceRetailer`
    fn renounce_retailer(&self, caller: Identity) -> Result<(), LedgerError> {
        self.renounce_role(caller, RoleKind::Retailer)
    }

    /// `renounceConsumer`
    fn renounce_consumer(&self, caller: Identity) -> Result<(), LedgerError> {
        self.renounce_role(caller, RoleKind::Consumer)
    }

    /// `isDistributor`
    fn is_distributor(&self, account: &Identity) -> bool {
        self.has_role(RoleKind::Distributor, account)
    }

    /// `isRetailer`
    fn is_retailer(&self, account: &Identity) -> bool {
        self.has_role(RoleKind::Retailer, account)
    }

    /// `isConsumer`
    fn is_consumer(&self, account: &Identity) -> bool {
        self.has_role(RoleKind::Consumer, account)
    }
}

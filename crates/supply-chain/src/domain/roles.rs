//! # Role Registry
//!
//! Admin-provisioned role sets. Farmer is not here: it is fixed per item by
//! whoever harvested it.

use crate::domain::value_objects::{Identity, Operation, Requirement, RoleKind};
use crate::errors::LedgerError;
use std::collections::HashSet;

/// Distributor, Retailer and Consumer sets plus the administrative identity.
#[derive(Clone, Debug)]
pub struct RoleRegistry {
    admin: Identity,
    distributors: HashSet<Identity>,
    retailers: HashSet<Identity>,
    consumers: HashSet<Identity>,
}

impl RoleRegistry {
    /// Empty registry administered by `admin`.
    #[must_use]
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            distributors: HashSet::new(),
            retailers: HashSet::new(),
            consumers: HashSet::new(),
        }
    }

    /// Current administrative identity.
    #[must_use]
    pub fn admin(&self) -> Identity {
        self.admin
    }

    /// True if `account` administers the registry.
    #[must_use]
    pub fn is_admin(&self, account: &Identity) -> bool {
        !account.is_zero() && self.admin == *account
    }

    /// Membership lookup.
    #[must_use]
    pub fn has_role(&self, role: RoleKind, account: &Identity) -> bool {
        self.set(role).contains(account)
    }

    /// Number of members in a set.
    #[must_use]
    pub fn member_count(&self, role: RoleKind) -> usize {
        self.set(role).len()
    }

    /// Add `account` to a role set. Admin only.
    ///
    /// Returns `false` if it was already a member.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for a non-admin caller, `InvalidIdentity` for the empty
    /// identity.
    pub fn grant(
        &mut self,
        caller: Identity,
        role: RoleKind,
        account: Identity,
    ) -> Result<bool, LedgerError> {
        self.require_admin(Operation::AddRole(role), caller)?;
        if account.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }
        Ok(self.set_mut(role).insert(account))
    }

    /// Remove the caller from a role set.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the caller is not a member.
    pub fn renounce(&mut self, caller: Identity, role: RoleKind) -> Result<(), LedgerError> {
        if self.set_mut(role).remove(&caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                operation: Operation::RenounceRole(role),
                caller,
                required: Requirement::Member(role),
            })
        }
    }

    /// Hand the admin identity to `new_admin`. Returns the previous admin.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for a non-admin caller, `InvalidIdentity` for the empty
    /// identity.
    pub fn transfer_admin(
        &mut self,
        caller: Identity,
        new_admin: Identity,
    ) -> Result<Identity, LedgerError> {
        self.require_admin(Operation::TransferAdmin, caller)?;
        if new_admin.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }
        Ok(std::mem::replace(&mut self.admin, new_admin))
    }

    fn require_admin(&self, operation: Operation, caller: Identity) -> Result<(), LedgerError> {
        if self.is_admin(&caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                operation,
                caller,
                required: Requirement::Admin,
            })
        }
    }

    fn set(&self, role: RoleKind) -> &HashSet<Identity> {
        match role {
            RoleKind::Distributor => &self.distributors,
            RoleKind::Retailer => &self.retailers,
            RoleKind::Consumer => &self.consumers,
        }
    }

    fn set_mut(&mut self, role: RoleKind) -> &mut HashSet<Identity> {
        match role {
            RoleKind::Distributor => &mut self.distributors,
            RoleKind::Retailer => &mut self.retailers,
            RoleKind::Consumer => &mut self.consumers,
        }
    }
}

//! # Shared Types Crate
//!
//! Value types shared by every crate in the supply chain ledger workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identities, product codes, amounts and the
//!   item state ordinals are defined here once.
//! - **Opaque Identity**: an [`Identity`] is a comparable 20-byte token handed
//!   to the ledger by the identity provider. The ledger never interprets it.
//! - **Integer Money**: every [`Amount`] is a count of base units
//!   (10^-18 of a whole unit), never a float.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;

//! # Domain Layer (Inner Hexagon)
//!
//! Pure ledger logic: the item record, the transition table, escrow
//! settlement arithmetic, the role registry and the invariants.
//! NO I/O, NO locking, NO async.
//!
//! Dependencies point inward only; adapters and the ledger engine depend on
//! this module, never the reverse.

pub mod entities;
pub mod invariants;
pub mod roles;
pub mod settlement;
pub mod transitions;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use roles::*;
pub use settlement::*;
pub use transitions::*;
pub use value_objects::*;

//! # Core Domain Entities
//!
//! Value types that cross crate boundaries.
//!
//! ## Clusters
//!
//! - **Identity**: `Identity`
//! - **Item Keys**: `Upc`, `Sku`, `ProductId`
//! - **Money**: `Amount`, `units`, `milli_units`
//! - **Lifecycle**: `ItemState`, `EventKind`, `TransitionEvent`
//! - **Roles**: `RoleKind`

use crate::errors::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// An authenticated caller identity (20-byte account id).
///
/// Text form is `0x` followed by 40 hex digits. Serialized in that form so
/// JSON payloads stay human readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity(pub [u8; 20]);

impl Identity {
    /// The empty identity (0x0000...0000). Never a valid participant.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an identity from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Convenience constructor used heavily by tests and fixtures:
    /// every byte set to `byte`.
    #[must_use]
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the empty identity.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Full `0x`-prefixed hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Identity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 20] = raw
            .as_slice()
            .try_into()
            .map_err(|_| ParseError::InvalidLength {
                expected: 20,
                actual: raw.len(),
            })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Identity {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// CLUSTER B: ITEM KEYS
// =============================================================================

/// Unique product code. Caller supplied, unique across all items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Upc(pub u64);

impl fmt::Display for Upc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stock keeping unit. Assigned by the ledger at harvest, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(pub u64);

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product identifier, `sku + upc`. Widened so the sum never overflows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u128);

impl ProductId {
    /// Derives the product id from the item keys.
    #[must_use]
    pub fn derive(sku: Sku, upc: Upc) -> Self {
        Self(u128::from(sku.0) + u128::from(upc.0))
    }
}

// =============================================================================
// CLUSTER C: MONEY
// =============================================================================

/// Amount of funds in base units.
pub type Amount = U256;

/// Base units per whole unit (10^18).
pub const BASE_UNITS_PER_UNIT: u64 = 1_000_000_000_000_000_000;

/// `n` whole units expressed in base units.
#[must_use]
pub fn units(n: u64) -> Amount {
    U256::from(n) * U256::from(BASE_UNITS_PER_UNIT)
}

/// `n` thousandths of a unit expressed in base units.
#[must_use]
pub fn milli_units(n: u64) -> Amount {
    U256::from(n) * U256::from(BASE_UNITS_PER_UNIT / 1_000)
}

// =============================================================================
// CLUSTER D: LIFECYCLE
// =============================================================================

/// Item state machine. Ordinals are fixed and strictly increasing along the
/// chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ItemState {
    /// Created by the farmer.
    Harvested = 0,
    /// Processed by the farmer.
    Processed = 1,
    /// Packed by the farmer.
    Packed = 2,
    /// Listed for sale at a fixed price.
    ForSale = 3,
    /// Bought by a distributor.
    Sold = 4,
    /// Shipped by the distributor.
    Shipped = 5,
    /// Received by a retailer.
    Received = 6,
    /// Purchased by a consumer. Terminal.
    Purchased = 7,
}

impl ItemState {
    /// All states in chain order.
    pub const ALL: [ItemState; 8] = [
        Self::Harvested,
        Self::Processed,
        Self::Packed,
        Self::ForSale,
        Self::Sold,
        Self::Shipped,
        Self::Received,
        Self::Purchased,
    ];

    /// Numeric ordinal (0-7).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// State for an ordinal, if in range.
    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    /// The state that follows this one, `None` for the terminal state.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    /// True only for `Purchased`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Purchased
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Harvested => "Harvested",
            Self::Processed => "Processed",
            Self::Packed => "Packed",
            Self::ForSale => "ForSale",
            Self::Sold => "Sold",
            Self::Shipped => "Shipped",
            Self::Received => "Received",
            Self::Purchased => "Purchased",
        }
    }

    /// Lowercase phrase used in guard failures ("Item must be <phrase>").
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Harvested => "harvested",
            Self::Processed => "processed",
            Self::Packed => "packed",
            Self::ForSale => "for sale",
            Self::Sold => "sold",
            Self::Shipped => "shipped",
            Self::Received => "received",
            Self::Purchased => "purchased",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a transition event. One per state; the event for a transition is
/// named after the state it enters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Item created.
    Harvested,
    /// Item processed.
    Processed,
    /// Item packed.
    Packed,
    /// Item listed for sale.
    ForSale,
    /// Item bought by a distributor.
    Sold,
    /// Item shipped.
    Shipped,
    /// Item received by a retailer.
    Received,
    /// Item purchased by a consumer.
    Purchased,
}

impl EventKind {
    /// Event emitted on entering `state`.
    #[must_use]
    pub const fn entering(state: ItemState) -> Self {
        match state {
            ItemState::Harvested => Self::Harvested,
            ItemState::Processed => Self::Processed,
            ItemState::Packed => Self::Packed,
            ItemState::ForSale => Self::ForSale,
            ItemState::Sold => Self::Sold,
            ItemState::Shipped => Self::Shipped,
            ItemState::Received => Self::Received,
            ItemState::Purchased => Self::Purchased,
        }
    }

    /// State reached by the transition that emits this event.
    #[must_use]
    pub const fn resulting_state(self) -> ItemState {
        match self {
            Self::Harvested => ItemState::Harvested,
            Self::Processed => ItemState::Processed,
            Self::Packed => ItemState::Packed,
            Self::ForSale => ItemState::ForSale,
            Self::Sold => ItemState::Sold,
            Self::Shipped => ItemState::Shipped,
            Self::Received => ItemState::Received,
            Self::Purchased => ItemState::Purchased,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resulting_state().name())
    }
}

/// One entry of the append-only event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Global append position, starting at 1.
    pub sequence: u64,
    /// Item the transition applied to.
    pub upc: Upc,
    /// What happened.
    pub kind: EventKind,
    /// Caller that performed the transition.
    pub participant: Identity,
    /// State after the transition.
    pub state: ItemState,
    /// Listing price for `ForSale`, settled price for `Sold`/`Purchased`.
    pub amount: Option<Amount>,
}

// =============================================================================
// CLUSTER E: ROLES
// =============================================================================

/// Registry-backed roles.
///
/// Farmer is not listed: it is structural, fixed by who harvested the item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    /// May buy items that are for sale.
    Distributor,
    /// May receive shipped items.
    Retailer,
    /// May purchase received items when the consumer policy is `Registered`.
    Consumer,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distributor => "Distributor",
            Self::Retailer => "Retailer",
            Self::Consumer => "Consumer",
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

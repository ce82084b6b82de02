//! # Error Types
//!
//! Errors raised while constructing shared value types.

use thiserror::Error;

/// Errors parsing a value type from its text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input is not valid hexadecimal.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded byte length does not match the type.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Input is not a recognised keyword.
    #[error("Unknown value: {0}")]
    UnknownValue(String),
}

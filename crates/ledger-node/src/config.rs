//! # Node Configuration
//!
//! Ledger parameters and genesis balances, read from the environment.
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `SC_ADMIN` | yes | `0x`-prefixed identity of the role registry admin |
//! | `SC_CONSUMER_POLICY` | no | `open` (default) or `registered` |
//! | `SC_EVENT_CAPACITY` | no | Event bus channel capacity (default 1000) |
//! | `SC_GENESIS_BALANCES` | no | `0xaddr=units,0xaddr=units` opening balances |
//!
//! Telemetry has its own variables, see `ledger_telemetry::TelemetryConfig`.

use shared_types::{units, Amount, Identity};
use supply_chain::domain::ConsumerPolicy;
use supply_chain::ledger::LedgerConfig;
use thiserror::Error;

/// Admin identity.
pub const ENV_ADMIN: &str = "SC_ADMIN";
/// Consumer policy.
pub const ENV_CONSUMER_POLICY: &str = "SC_CONSUMER_POLICY";
/// Event bus capacity.
pub const ENV_EVENT_CAPACITY: &str = "SC_EVENT_CAPACITY";
/// Opening balances.
pub const ENV_GENESIS_BALANCES: &str = "SC_GENESIS_BALANCES";

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Ledger parameters.
    pub ledger: LedgerConfig,
    /// Opening balances of the in-memory funds sink.
    pub genesis_balances: Vec<(Identity, Amount)>,
}

impl NodeConfig {
    /// Config with no opening balances.
    #[must_use]
    pub fn new(ledger: LedgerConfig) -> Self {
        Self {
            ledger,
            genesis_balances: Vec::new(),
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_raw = get(ENV_ADMIN).ok_or(ConfigError::MissingAdmin)?;
        let admin = parse_identity(ENV_ADMIN, &admin_raw)?;
        if admin.is_zero() {
            return Err(ConfigError::ZeroAdmin);
        }

        let mut ledger = LedgerConfig::new(admin);

        if let Some(raw) = get(ENV_CONSUMER_POLICY) {
            let policy: ConsumerPolicy = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPolicy(raw.clone()))?;
            ledger = ledger.with_consumer_policy(policy);
        }

        if let Some(raw) = get(ENV_EVENT_CAPACITY) {
            let capacity: usize = raw
                .trim()
                .parse()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| ConfigError::InvalidCapacity(raw.clone()))?;
            ledger = ledger.with_event_channel_capacity(capacity);
        }

        let genesis_balances = match get(ENV_GENESIS_BALANCES) {
            Some(raw) => parse_balances(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            ledger,
            genesis_balances,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `SC_ADMIN` is not set.
    #[error("SC_ADMIN is required: set it to the registry admin's 0x address")]
    MissingAdmin,

    /// `SC_ADMIN` is the empty identity.
    #[error("SC_ADMIN must not be the zero address")]
    ZeroAdmin,

    /// An identity did not parse.
    #[error("{var}: invalid identity {value:?}: {reason}")]
    InvalidIdentity {
        /// Variable it came from.
        var: &'static str,
        /// Raw text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Unknown consumer policy.
    #[error("SC_CONSUMER_POLICY: expected open or registered, got {0:?}")]
    InvalidPolicy(String),

    /// Capacity not a positive integer.
    #[error("SC_EVENT_CAPACITY: expected a positive integer, got {0:?}")]
    InvalidCapacity(String),

    /// Genesis entry not of the form `0xaddr=units`.
    #[error("SC_GENESIS_BALANCES: malformed entry {0:?}")]
    InvalidGenesisEntry(String),
}

fn parse_identity(var: &'static str, raw: &str) -> Result<Identity, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e: shared_types::ParseError| ConfigError::InvalidIdentity {
            var,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Parse `0xaddr=units,...`. Whole units; empty entries are skipped.
fn parse_balances(raw: &str) -> Result<Vec<(Identity, Amount)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (account, amount) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidGenesisEntry(entry.to_string()))?;
            let account = parse_identity(ENV_GENESIS_BALANCES, account)?;
            let amount: u64 = amount
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidGenesisEntry(entry.to_string()))?;
            Ok((account, units(amount)))
        })
        .collect()
}

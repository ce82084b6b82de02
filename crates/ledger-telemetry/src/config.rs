//! Telemetry settings, read from `SC_*` environment variables.

/// Service name used when `SC_SERVICE_NAME` is unset.
const DEFAULT_SERVICE: &str = "supply-chain-ledger";

/// Logging and metrics settings.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Attached to every log line as `service`.
    pub service_name: String,

    /// A bare level (`debug`) or a full `EnvFilter` directive such as
    /// `supply_chain=debug,info`.
    pub log_level: String,

    /// Install the log subscriber at all. Off in tests that only want metrics.
    pub console_output: bool,

    /// One JSON object per log line instead of human-readable text.
    pub json_logs: bool,

    /// Register the Prometheus collectors.
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE.to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Read from the process environment.
    ///
    /// `SC_LOG_LEVEL` falls back to `RUST_LOG`. `SC_JSON_LOGS` defaults to on
    /// when `KUBERNETES_SERVICE_HOST` or `DOCKER_CONTAINER` is set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| get(key).map_or(default, |v| parse_flag(&v));
        let in_container =
            get("KUBERNETES_SERVICE_HOST").is_some() || get("DOCKER_CONTAINER").is_some();

        Self {
            service_name: get("SC_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: get("SC_LOG_LEVEL")
                .or_else(|| get("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            console_output: flag("SC_CONSOLE_OUTPUT", defaults.console_output),
            json_logs: flag("SC_JSON_LOGS", in_container),
            metrics_enabled: flag("SC_METRICS", defaults.metrics_enabled),
        }
    }
}

/// `false`, `0`, `no` and `off` (any case) are false; anything else is true.
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

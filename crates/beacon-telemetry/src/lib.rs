//! Tracing initialization for the beacon service.
//!
//! All state in this service is in-memory by design, so logs go to stdout
//! only: human-readable by default, JSON when running under a collector.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by the RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "beacon_limits" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Emit newline-delimited JSON instead of the human-readable format.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Defaults plus the LOG_FORMAT env var ("json" switches output format).
    pub fn from_env() -> Self {
        let json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self {
            json,
            ..Self::default()
        }
    }
}

/// Initialize the telemetry subsystem. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(fmt_layer).init();
    }
}

/// Build the filter directive string from the configured levels.
fn filter_directive(config: &TelemetryConfig) -> String {
    let mut directive = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        directive.push_str(&format!(
            ",{}={}",
            module,
            level.to_string().to_lowercase()
        ));
    }
    directive
}

//! # Indexer Telemetry
//!
//! Logging and Prometheus metrics for the indexer coordinator tools.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber, human or JSON, written to stderr
//! - **Metrics**: Prometheus registry, dumped in text format on demand
//!
//! ## Usage
//!
//! ```rust,ignore
//! use idx_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IDX_SERVICE_NAME` | `idx-admin` | Service name in logs |
//! | `IDX_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `IDX_JSON_LOGS` | `false` | JSON log lines (default on in containers) |
//! | `IDX_CONSOLE_OUTPUT` | `true` | Disable to silence logs |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
pub mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, INVALIDATIONS, REINDEX_DURATION, REINDEX_TOTAL, REGISTRY,
    ROWS_REINDEXED, VIEWS_SUSPENDED, VIEW_BACKLOG,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// Metrics registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Bad configuration value, e.g. an unparsable log filter.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

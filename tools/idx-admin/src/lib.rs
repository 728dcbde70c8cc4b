//! # idx-admin
//!
//! Operator CLI for the indexer coordinator. Wires the JSON file state store
//! and command actions into an `IndexerRegistry` and exposes the batch
//! operations as subcommands.
//!
//! ## Module Structure
//!
//! ```text
//! idx-admin/
//! ├── cli.rs        # clap definitions
//! ├── context.rs    # Adapter wiring from --config / --state
//! ├── metrics.rs    # MetricsRecorder -> Prometheus bridge
//! └── commands/     # One module per subcommand
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod context;
pub mod metrics;

pub use cli::{Cli, Commands, ModeArg, StatusArg};
pub use context::AdminContext;
pub use metrics::PrometheusMetrics;

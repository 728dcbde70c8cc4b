//! Command line definitions.

use clap::{Parser, Subcommand, ValueEnum};
use idx_coordinator::IndexerStatus;
use std::path::PathBuf;

/// Indexer administration
#[derive(Parser, Debug)]
#[command(name = "idx-admin", about = "Manage indexer status, mode and reindexing", version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Indexer definitions (TOML)
    #[arg(long, global = true, env = "IDX_CONFIG", default_value = "indexers.toml")]
    pub config: PathBuf,

    /// State document (JSON)
    #[arg(
        long,
        global = true,
        env = "IDX_STATE_PATH",
        default_value = "var/indexer_state.json"
    )]
    pub state: PathBuf,

    /// Print Prometheus metrics after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Machine-readable output where supported
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured indexers
    Info,

    /// Show indexer status
    Status {
        /// Indexer ids (all when omitted)
        ids: Vec<String>,
    },

    /// Fully rebuild indexers and whatever they pull in
    Reindex {
        /// Indexer ids (all when omitted)
        ids: Vec<String>,
    },

    /// Mark indexers invalid
    Reset {
        /// Indexer ids (all when omitted)
        ids: Vec<String>,
    },

    /// Switch between update on save and update by schedule
    SetMode {
        /// Target mode
        #[arg(value_enum)]
        mode: ModeArg,

        /// Indexer ids (all when omitted)
        ids: Vec<String>,
    },

    /// Show indexer mode
    ShowMode {
        /// Indexer ids (all when omitted)
        ids: Vec<String>,
    },

    /// Override indexer status
    SetStatus {
        /// Target status
        #[arg(value_enum)]
        status: StatusArg,

        /// Indexer ids (all when omitted)
        ids: Vec<String>,
    },

    /// Show what runs before and after an indexer
    Dependencies {
        /// Indexer id
        id: String,
    },

    /// Apply pending changelog entries for scheduled indexers
    Update,

    /// Record entity changes in a view's changelog
    Changelog {
        /// View id
        view_id: String,

        /// Changed entity ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

/// `set-mode` argument.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Update on save
    Realtime,
    /// Update by schedule
    Schedule,
}

impl ModeArg {
    /// Whether this is schedule mode.
    pub fn is_scheduled(self) -> bool {
        self == Self::Schedule
    }
}

/// `set-status` argument. WORKING is only ever set by a running reindex.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusArg {
    /// Ready
    Valid,
    /// Reindex required
    Invalid,
    /// Excluded from reindexing
    Suspended,
}

impl From<StatusArg> for IndexerStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Valid => IndexerStatus::Valid,
            StatusArg::Invalid => IndexerStatus::Invalid,
            StatusArg::Suspended => IndexerStatus::Suspended,
        }
    }
}

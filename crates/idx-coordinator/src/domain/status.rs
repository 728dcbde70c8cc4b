//! # Status Value Objects
//!
//! Closed status enums for indexers and their changelog views.
//!
//! ## Indexer Status Machine
//!
//! ```text
//!              ┌──────────── invalidate (from any state) ────────────┐
//!              ▼                                                      │
//!         [INVALID] ──reindex──→ [WORKING] ──success──→ [VALID] ──────┘
//!              ▲                     │                     │
//!              └──────failure────────┘                     │
//!              │                                           │
//!              └──set-status──→ [SUSPENDED] ←──set-status──┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Indexer status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexerStatus {
    /// Materialized data is current.
    Valid,
    /// Materialized data must be rebuilt. Initial status of every indexer.
    #[default]
    Invalid,
    /// A full rebuild is in progress.
    Working,
    /// Rebuilds are paused by an operator.
    Suspended,
}

impl IndexerStatus {
    /// Check if transition to next status is valid.
    pub fn can_transition_to(&self, next: IndexerStatus) -> bool {
        match (self, next) {
            (current, next) if *current == next => true,
            (_, Self::Invalid) => true,
            (Self::Valid | Self::Invalid, Self::Working) => true,
            (Self::Working, Self::Valid) => true,
            (Self::Valid | Self::Invalid, Self::Suspended) => true,
            (Self::Suspended, Self::Valid) => true,
            // Operator override without a rebuild
            (Self::Invalid, Self::Valid) => true,
            _ => false,
        }
    }

    /// Lowercase name used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Working => "working",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for IndexerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            "working" => Ok(Self::Working),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("unknown indexer status: {other}")),
        }
    }
}

/// Whether a view is subscribed to its changelog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Subscribed: the indexer runs on schedule.
    Enabled,
    /// Unsubscribed: the indexer runs on save.
    #[default]
    Disabled,
}

/// Processing status of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    /// No changelog processing in progress.
    #[default]
    Idle,
    /// Changelog rows are being applied.
    Working,
    /// Changelog processing is paused around a full rebuild.
    Suspended,
}

impl fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Suspended => "suspended",
        })
    }
}

/// Operator-facing indexer mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexerMode {
    /// Update on save.
    Realtime,
    /// Update by schedule from the changelog.
    Schedule,
}

impl IndexerMode {
    /// Mode for a view that is or is not subscribed.
    pub fn from_scheduled(scheduled: bool) -> Self {
        if scheduled {
            Self::Schedule
        } else {
            Self::Realtime
        }
    }

    /// Whether this mode subscribes the view.
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Schedule)
    }
}

impl fmt::Display for IndexerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Realtime => "Update on Save",
            Self::Schedule => "Update by Schedule",
        })
    }
}

impl FromStr for IndexerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtime" => Ok(Self::Realtime),
            "schedule" => Ok(Self::Schedule),
            other => Err(format!("unknown indexer mode: {other}")),
        }
    }
}

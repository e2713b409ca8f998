//! Error types for the stats tracker.
//!
//! Every error here signals a programmer or integration mistake, not a
//! runtime condition to recover from: calls from the wrong process role,
//! update shapes the tracker does not define, and invalid configuration.
//! All variants propagate synchronously to the caller; there is no retry
//! or backoff anywhere in this crate.

use thiserror::Error;

use crate::stats::Stat;

/// Errors surfaced by [`StatsTracker`](crate::StatsTracker) operations.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A mutating or reporting call was made from a non-main process.
    ///
    /// The tracker is single-writer: only the designated main process may
    /// record or read stats in a multi-process run.
    #[error("stats written from non-main process (rank {rank}); only the main process may mutate the tracker")]
    RoleViolation {
        /// Rank of the offending process.
        rank: u32,
    },

    /// An update's shape conflicts with the shape fixed by the key's
    /// first update.
    ///
    /// A key that entered averaged mode (interval updates carrying a step)
    /// cannot later receive scalar-style updates, and vice versa.
    #[error("mixed update mode for {stat:?}: key is already {existing}, got a {attempted} update")]
    MixedUpdateMode {
        /// The metric key being updated.
        stat: Stat,
        /// Shape the key already holds ("scalar" or "averaged").
        existing: &'static str,
        /// Shape the rejected update would have produced.
        attempted: &'static str,
    },

    /// Throughput derivation was requested over a zero or negative interval.
    #[error("cannot derive throughput over a non-positive interval ({seconds} s)")]
    NonPositiveDuration {
        /// The offending interval length in seconds.
        seconds: f64,
    },

    /// Construction-time configuration validation failed.
    #[error("invalid stats configuration: {detail}")]
    InvalidConfig {
        /// Description of the configuration issue.
        detail: String,
    },
}

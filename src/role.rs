//! Process role detection for multi-process training jobs.
//!
//! Launchers such as torchrun spawn one process per device and expose the
//! process index through the `RANK` environment variable. Exactly one
//! process (rank 0, the "main" process) is allowed to write to and read
//! from the stats tracker; all others must stay silent. The role is
//! detected once and passed explicitly to whatever needs it, rather than
//! consulted through ambient global state.

use serde::{Deserialize, Serialize};

/// Role of this process within a (possibly multi-process) training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessRole {
    /// The designated writer process (rank 0 or single-process runs).
    Main,
    /// A non-main worker process.
    Worker {
        /// Process rank as reported by the launcher.
        rank: u32,
    },
}

impl ProcessRole {
    /// Detect the role of the current process from the `RANK` environment
    /// variable.
    ///
    /// An absent, empty, or unparseable `RANK` is treated as a
    /// single-process run, i.e. `Main`.
    pub fn detect() -> Self {
        match std::env::var("RANK").ok().and_then(|v| v.parse::<u32>().ok()) {
            None | Some(0) => Self::Main,
            Some(rank) => Self::Worker { rank },
        }
    }

    /// Whether this process is the designated writer.
    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }

    /// Process rank (0 for the main process).
    pub fn rank(&self) -> u32 {
        match self {
            Self::Main => 0,
            Self::Worker { rank } => *rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_is_main() {
        assert!(ProcessRole::Main.is_main());
        assert_eq!(ProcessRole::Main.rank(), 0);
    }

    #[test]
    fn test_worker_is_not_main() {
        let role = ProcessRole::Worker { rank: 3 };
        assert!(!role.is_main());
        assert_eq!(role.rank(), 3);
    }
}

//! Configuration for the stats tracker.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::stats::Stat;

/// Stats tracker configuration.
///
/// Chosen once at training start; the tracked set and history length are
/// fixed for the lifetime of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Whether stats tracking is enabled at all. A disabled tracker turns
    /// every operation into a no-op and holds no data.
    pub enabled: bool,
    /// Capacity of the per-metric history buffer used for moving averages.
    pub max_history: usize,
    /// Metrics enabled for aggregation; updates to any other key are
    /// silently ignored.
    pub tracked: Vec<Stat>,
    /// Total planned iteration count, used only for the ETA derivation.
    pub max_iterations: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history: 20,
            tracked: vec![
                Stat::DataLoadTime,
                Stat::IterTime,
                Stat::TotalTrainTime,
                Stat::SamplesPerSec,
                Stat::Eta,
            ],
            max_iterations: 10_000,
        }
    }
}

impl StatsConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading stats config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("parsing stats config from {}", path.display()))?;
        Ok(config)
    }

    /// Validate invariants the tracker relies on.
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.max_history == 0 {
            return Err(StatsError::InvalidConfig {
                detail: "max_history must be at least 1".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(StatsError::InvalidConfig {
                detail: "max_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

//! In-process metrics aggregation for iterative training loops.
//!
//! This crate provides:
//! - Bounded-history moving averages over per-iteration interval samples
//! - Dual-mode updates: raw scalar values and time-interval-derived values
//! - An ETA estimate derived from the tracked iteration-duration metric
//! - Single-writer process gating for multi-process training jobs
//! - A terminal presenter rendering a periodic progress line
//!
//! # Example
//!
//! ```
//! use training_stats::{ProcessRole, Stat, StatsConfig, StatsTracker};
//!
//! let mut tracker = StatsTracker::new(StatsConfig::default(), ProcessRole::Main)?;
//! for step in 1..=5 {
//!     let start = (step - 1) as f64 * 0.5;
//!     tracker.record_interval(Stat::IterTime, start, start + 0.5, Some(step), None)?;
//! }
//! let snapshot = tracker.snapshot_for_display(5.0 / 10_000.0)?;
//! assert_eq!(snapshot.step, 5);
//! # Ok::<(), training_stats::StatsError>(())
//! ```

pub mod config;
pub mod error;
pub mod presenter;
pub mod role;
pub mod stats;

pub use config::StatsConfig;
pub use error::StatsError;
pub use presenter::{ConsolePresenter, PresenterConfig};
pub use role::ProcessRole;
pub use stats::{MetricState, Stat, StatRow, StatSnapshot, StatsTracker, Unit};

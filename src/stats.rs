//! Bounded-history metric aggregation for training loops.
//!
//! The [`StatsTracker`] accumulates scalar measurements emitted once per
//! iteration, keeps a bounded ring buffer of recent interval samples per
//! metric, and derives an ETA from the average iteration duration. It is
//! pure in-memory computation: a single designated writer process mutates
//! it sequentially, and a presenter renders its snapshots.
//!
//! Two update modes exist per metric:
//! - **Scalar**: the latest raw value, overwritten on every update (used
//!   for quality scores and one-shot totals such as total elapsed time).
//! - **Averaged**: a FIFO buffer of the most recent interval samples plus
//!   the exact mean over the current buffer contents. The mean is
//!   recomputed from the full buffer on every insertion, so it never
//!   drifts across long runs.
//!
//! A metric's mode is fixed by its first update; mixing modes is rejected.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::error::StatsError;
use crate::role::ProcessRole;

/// The closed universe of trackable metrics.
///
/// Each key carries a display label and a unit class used purely for
/// formatting; which keys are actually aggregated is decided by the
/// configured tracked set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    /// Time spent loading the batch for one iteration.
    DataLoadTime,
    /// Duration of one training iteration.
    IterTime,
    /// Total elapsed training time.
    TotalTrainTime,
    /// Training throughput in samples per second.
    SamplesPerSec,
    /// Most recent evaluation quality score.
    TestScore,
    /// Estimated time to completion, derived from the iteration-time
    /// average. Has no independent update path.
    Eta,
}

impl Stat {
    /// Column label used by the presenter.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DataLoadTime => "Data Load (ms)",
            Self::IterTime => "Train Iter (ms)",
            Self::TotalTrainTime => "Train Total (time)",
            Self::SamplesPerSec => "Samples Per Sec (1/s)",
            Self::TestScore => "Test Score",
            Self::Eta => "ETA (time)",
        }
    }

    /// Unit class driving display formatting.
    pub fn unit(&self) -> Unit {
        match self {
            Self::DataLoadTime | Self::IterTime => Unit::Milliseconds,
            Self::TotalTrainTime | Self::Eta => Unit::Duration,
            Self::SamplesPerSec => Unit::Rate,
            Self::TestScore => Unit::Count,
        }
    }
}

/// Unit class of a metric, used only for display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Seconds, rendered as a human-readable elapsed-time string.
    Duration,
    /// Seconds, rendered as milliseconds with four decimals.
    Milliseconds,
    /// Per-second rate, rendered as a plain number.
    Rate,
    /// Dimensionless value, rendered as a plain number.
    Count,
}

/// Per-metric aggregation state.
///
/// The shape is fixed by the first update to the key and matched
/// exhaustively at read time.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricState {
    /// Latest raw value, no averaging.
    Scalar(f64),
    /// Bounded FIFO history of recent samples plus the cached mean over
    /// the current buffer contents.
    Averaged {
        /// Most recent samples, oldest first. Length never exceeds the
        /// configured `max_history`.
        buffer: VecDeque<f64>,
        /// Arithmetic mean of `buffer`, recomputed on every insertion.
        avg: f64,
    },
}

impl MetricState {
    /// The value a reader should display: the raw scalar, or the cached
    /// mean for averaged metrics (never a raw buffer entry).
    pub fn display_value(&self) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::Averaged { avg, .. } => *avg,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Averaged { .. } => "averaged",
        }
    }
}

/// One formatted display entry.
#[derive(Debug, Clone, Serialize)]
pub struct StatRow {
    /// Column label.
    pub label: &'static str,
    /// Value formatted per the metric's unit class.
    pub formatted: String,
}

/// Point-in-time view of the tracker, ready for rendering.
///
/// Rows appear in key insertion order. `rows` is empty until the tracker
/// has received its first step-bearing update, since there is nothing
/// meaningful to show before then.
#[derive(Debug, Clone, Serialize)]
pub struct StatSnapshot {
    /// Step of the most recent update.
    pub step: u64,
    /// Progress through the planned run, in [0, 1].
    pub fraction_done: f64,
    /// Whether the presenter should (re-)emit the header row: set on the
    /// first snapshot and whenever a new key appeared since the last one.
    pub needs_header: bool,
    /// Column labels in insertion order.
    pub labels: Vec<&'static str>,
    /// Formatted data cells in insertion order.
    pub rows: Vec<StatRow>,
}

impl StatSnapshot {
    /// Progress rendered as a percentage.
    pub fn percent_done(&self) -> f64 {
        self.fraction_done * 100.0
    }

    fn empty(fraction_done: f64) -> Self {
        Self {
            step: 0,
            fraction_done,
            needs_header: false,
            labels: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// In-process aggregator for per-iteration training metrics.
///
/// Constructed once at training start from a [`StatsConfig`] and the
/// detected [`ProcessRole`], mutated once per metric per iteration by the
/// training loop, and read through [`snapshot_for_display`]. There is no
/// ambient global instance; ownership belongs to the training loop.
///
/// [`snapshot_for_display`]: StatsTracker::snapshot_for_display
///
/// # Example
///
/// ```
/// use training_stats::{ProcessRole, Stat, StatsConfig, StatsTracker};
///
/// let mut tracker = StatsTracker::new(StatsConfig::default(), ProcessRole::Main)?;
/// tracker.record_interval(Stat::IterTime, 10.0, 10.5, Some(1), None)?;
/// let snapshot = tracker.snapshot_for_display(0.001)?;
/// assert_eq!(snapshot.step, 1);
/// # Ok::<(), training_stats::StatsError>(())
/// ```
#[derive(Debug)]
pub struct StatsTracker {
    enabled: bool,
    max_history: usize,
    max_iterations: u64,
    tracked: Vec<Stat>,
    /// Per-key state in insertion order; insertion order is display order.
    entries: Vec<(Stat, MetricState)>,
    step: u64,
    new_key: bool,
    role: ProcessRole,
}

impl StatsTracker {
    /// Create a tracker from a validated configuration.
    ///
    /// A disabled configuration yields a tracker whose every operation is
    /// a permanent no-op.
    pub fn new(config: StatsConfig, role: ProcessRole) -> Result<Self, StatsError> {
        config.validate()?;
        if config.enabled {
            tracing::info!(
                max_history = config.max_history,
                max_iterations = config.max_iterations,
                tracked = config.tracked.len(),
                "stats tracker enabled"
            );
        } else {
            tracing::info!("stats tracker disabled; enable in config");
        }
        Ok(Self {
            enabled: config.enabled,
            max_history: config.max_history,
            max_iterations: config.max_iterations,
            tracked: config.tracked,
            entries: Vec::new(),
            step: 0,
            new_key: false,
            role,
        })
    }

    /// Record the latest raw value for a metric (no averaging).
    ///
    /// Untracked keys are silently ignored. Last write wins when called
    /// twice for the same step. Fails with
    /// [`StatsError::MixedUpdateMode`] if the key previously entered
    /// averaged mode.
    pub fn record_value(&mut self, stat: Stat, value: f64, step: u64) -> Result<(), StatsError> {
        self.assert_main()?;
        if !self.enabled || !self.is_tracked(stat) {
            return Ok(());
        }
        self.set_scalar(stat, value)?;
        self.step = step;
        Ok(())
    }

    /// Record a time interval for a metric.
    ///
    /// The recorded value is `end_time - start_time` in seconds, or
    /// `batch_size / duration` (a throughput rate) when `batch_size` is
    /// given; throughput over a non-positive interval fails with
    /// [`StatsError::NonPositiveDuration`].
    ///
    /// With `step` absent the value is stored as a one-shot scalar total.
    /// With `step` present it is treated as a periodic sample: appended to
    /// the key's bounded buffer (oldest entry evicted at capacity) and the
    /// buffer mean is recomputed. Updating the iteration-time metric also
    /// refreshes the derived ETA when ETA is tracked.
    ///
    /// A negative interval without `batch_size` is not validated; it is a
    /// caller error and records a negative duration.
    pub fn record_interval(
        &mut self,
        stat: Stat,
        start_time: f64,
        end_time: f64,
        step: Option<u64>,
        batch_size: Option<u64>,
    ) -> Result<(), StatsError> {
        self.assert_main()?;
        if !self.enabled || !self.is_tracked(stat) {
            return Ok(());
        }

        let duration = end_time - start_time;
        let value = match batch_size {
            Some(batch) => {
                if duration <= 0.0 {
                    return Err(StatsError::NonPositiveDuration { seconds: duration });
                }
                batch as f64 / duration
            }
            None => duration,
        };

        let Some(step) = step else {
            // One-shot total: no averaging, step untouched.
            return self.set_scalar(stat, value);
        };

        self.push_sample(stat, value)?;
        self.step = step;

        // ETA is derived from the iteration-time average; it never has an
        // independent update path.
        if stat == Stat::IterTime && self.is_tracked(Stat::Eta) {
            let avg = self
                .state(Stat::IterTime)
                .map(MetricState::display_value)
                .unwrap_or(0.0);
            let remaining = self.max_iterations.saturating_sub(step);
            self.set_scalar(Stat::Eta, remaining as f64 * avg)?;
        }
        Ok(())
    }

    /// Produce the formatted view of the current state and consume the
    /// pending new-key header flag.
    pub fn snapshot_for_display(&mut self, fraction_done: f64) -> Result<StatSnapshot, StatsError> {
        self.assert_main()?;
        if !self.enabled {
            return Ok(StatSnapshot::empty(fraction_done));
        }

        let needs_header = self.step == 0 || self.new_key;
        self.new_key = false;

        let labels = self.entries.iter().map(|(stat, _)| stat.label()).collect();
        let rows = if self.step == 0 {
            Vec::new()
        } else {
            self.entries
                .iter()
                .map(|(stat, state)| StatRow {
                    label: stat.label(),
                    formatted: format_value(stat.unit(), state.display_value()),
                })
                .collect()
        };

        Ok(StatSnapshot {
            step: self.step,
            fraction_done,
            needs_header,
            labels,
            rows,
        })
    }

    /// Step of the most recent update.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Whether tracking is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether updates to this key are aggregated.
    pub fn is_tracked(&self, stat: Stat) -> bool {
        self.tracked.contains(&stat)
    }

    /// Current state for a key, if it has been seen.
    pub fn state(&self, stat: Stat) -> Option<&MetricState> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stat)
            .map(|(_, state)| state)
    }

    fn assert_main(&self) -> Result<(), StatsError> {
        if self.role.is_main() {
            Ok(())
        } else {
            Err(StatsError::RoleViolation {
                rank: self.role.rank(),
            })
        }
    }

    /// Overwrite or insert a scalar entry, flagging the header on first
    /// appearance. Rejects keys already in averaged mode.
    fn set_scalar(&mut self, stat: Stat, value: f64) -> Result<(), StatsError> {
        match self.entries.iter_mut().find(|(s, _)| *s == stat) {
            Some((_, state @ MetricState::Scalar(_))) => {
                *state = MetricState::Scalar(value);
                Ok(())
            }
            Some((_, state)) => Err(StatsError::MixedUpdateMode {
                stat,
                existing: state.shape(),
                attempted: "scalar",
            }),
            None => {
                self.entries.push((stat, MetricState::Scalar(value)));
                self.new_key = true;
                Ok(())
            }
        }
    }

    /// Append a periodic sample to a key's bounded buffer and recompute
    /// the mean over the full buffer. Rejects keys already in scalar mode.
    fn push_sample(&mut self, stat: Stat, value: f64) -> Result<(), StatsError> {
        let max_history = self.max_history;
        match self.entries.iter_mut().find(|(s, _)| *s == stat) {
            Some((_, MetricState::Averaged { buffer, avg })) => {
                if buffer.len() >= max_history {
                    buffer.pop_front();
                }
                buffer.push_back(value);
                *avg = buffer.iter().sum::<f64>() / buffer.len() as f64;
                Ok(())
            }
            Some((_, state)) => Err(StatsError::MixedUpdateMode {
                stat,
                existing: state.shape(),
                attempted: "averaged",
            }),
            None => {
                let mut buffer = VecDeque::with_capacity(max_history.min(1024));
                buffer.push_back(value);
                self.entries
                    .push((stat, MetricState::Averaged { buffer, avg: value }));
                self.new_key = true;
                Ok(())
            }
        }
    }
}

/// Format a value for display according to its unit class.
fn format_value(unit: Unit, value: f64) -> String {
    match unit {
        Unit::Duration => format_duration(value),
        Unit::Milliseconds => format!("{:.4}", value * 1e3),
        Unit::Rate | Unit::Count => format!("{value:.4}"),
    }
}

/// Format a duration in seconds as a human-readable elapsed-time string.
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.0}s")
    } else if secs < 3600.0 {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    } else {
        format!(
            "{:.0}h {:.0}m",
            (secs / 3600.0).floor(),
            ((secs % 3600.0) / 60.0).floor()
        )
    }
}

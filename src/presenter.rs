//! Terminal presenter for stats snapshots.
//!
//! Owns everything the tracker deliberately does not: column layout,
//! cursor control, and how often a line actually reaches the terminal.
//! The tracker only signals `needs_header`; this module decides what that
//! means on screen.

use std::io::{self, Write};

use crossterm::{cursor, execute};

use crate::stats::StatSnapshot;

const COLUMN_WIDTH: usize = 20;

/// Presenter configuration.
#[derive(Debug, Clone)]
pub struct PresenterConfig {
    /// Request a snapshot only when `step % print_every == 0` (step 0
    /// always passes, so the initial header is never suppressed).
    pub print_every: u64,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self { print_every: 10 }
    }
}

/// Renders [`StatSnapshot`]s as aligned columns on a terminal or any
/// other writer.
///
/// When a header must be re-emitted mid-run (a new key appeared), the
/// cursor is moved up over the previously printed block so the header is
/// rewritten in place and the earlier data lines are replayed beneath it.
pub struct ConsolePresenter<W: Write> {
    config: PresenterConfig,
    out: W,
    /// Data lines printed since the current header was drawn.
    past_lines: Vec<String>,
}

impl ConsolePresenter<io::Stdout> {
    /// Presenter writing to stdout.
    pub fn stdout(config: PresenterConfig) -> Self {
        Self::new(config, io::stdout())
    }
}

impl<W: Write> ConsolePresenter<W> {
    /// Presenter writing to an arbitrary sink.
    pub fn new(config: PresenterConfig, out: W) -> Self {
        Self {
            config,
            out,
            past_lines: Vec::new(),
        }
    }

    /// Whether a snapshot should be requested at this step.
    ///
    /// The presenter owns throttling: callers consult this before calling
    /// `snapshot_for_display`, so the tracker's new-key flag is only ever
    /// consumed by a snapshot that actually reaches the terminal.
    pub fn should_print(&self, step: u64) -> bool {
        let due = step % self.config.print_every == 0;
        if !due {
            tracing::debug!(step, "progress line suppressed");
        }
        due
    }

    /// Render one snapshot: header if requested, then the data row.
    pub fn present(&mut self, snapshot: &StatSnapshot) -> io::Result<()> {
        if snapshot.needs_header {
            self.print_header(snapshot)?;
        }

        if !snapshot.rows.is_empty() {
            let line = Self::data_line(snapshot);
            writeln!(self.out, "{line}")?;
            self.past_lines.push(line);
        }
        self.out.flush()
    }

    fn print_header(&mut self, snapshot: &StatSnapshot) -> io::Result<()> {
        // Mid-run header refresh: rewind over the printed block (data
        // lines plus the old header and rule), rewrite, then replay.
        if snapshot.step > 0 && !self.past_lines.is_empty() {
            let up = (self.past_lines.len() + 2).min(u16::MAX as usize) as u16;
            execute!(self.out, cursor::MoveUp(up))?;
        }

        let mut header = format!("{:<COLUMN_WIDTH$}", "Step (% Done)");
        for label in &snapshot.labels {
            header.push_str(&format!("{label:<COLUMN_WIDTH$} "));
        }
        writeln!(self.out, "{header}")?;
        writeln!(self.out, "{}", "-".repeat(header.len()))?;

        for line in &self.past_lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn data_line(snapshot: &StatSnapshot) -> String {
        let progress = format!("{} ({:.2}%)", snapshot.step, snapshot.percent_done());
        let mut line = format!("{progress:<COLUMN_WIDTH$}");
        for row in &snapshot.rows {
            line.push_str(&format!("{:<COLUMN_WIDTH$} ", row.formatted));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsConfig;
    use crate::role::ProcessRole;
    use crate::stats::{Stat, StatsTracker};

    fn snapshot_tracker() -> StatsTracker {
        let config = StatsConfig {
            enabled: true,
            max_history: 10,
            tracked: vec![Stat::IterTime, Stat::Eta],
            max_iterations: 100,
        };
        StatsTracker::new(config, ProcessRole::Main).unwrap()
    }

    #[test]
    fn test_header_and_row_layout() {
        let mut tracker = snapshot_tracker();
        tracker
            .record_interval(Stat::IterTime, 0.0, 0.5, Some(10), None)
            .unwrap();
        let snapshot = tracker.snapshot_for_display(0.1).unwrap();

        let mut presenter = ConsolePresenter::new(PresenterConfig::default(), Vec::new());
        presenter.present(&snapshot).unwrap();

        let output = String::from_utf8(presenter.out.clone()).unwrap();
        assert!(output.contains("Step (% Done)"));
        assert!(output.contains("Train Iter (ms)"));
        assert!(output.contains("ETA (time)"));
        assert!(output.contains("10 (10.00%)"));
        // 0.5 s iteration time rendered in milliseconds.
        assert!(output.contains("500.0000"));
    }

    #[test]
    fn test_should_print_follows_print_every() {
        let presenter = ConsolePresenter::new(PresenterConfig { print_every: 10 }, Vec::new());
        assert!(presenter.should_print(0));
        assert!(!presenter.should_print(7));
        assert!(presenter.should_print(10));
        assert!(!presenter.should_print(15));
        assert!(presenter.should_print(200));
    }

    #[test]
    fn test_header_not_repeated_without_new_key() {
        let mut tracker = snapshot_tracker();
        let mut presenter = ConsolePresenter::new(PresenterConfig { print_every: 10 }, Vec::new());

        tracker
            .record_interval(Stat::IterTime, 0.0, 0.5, Some(10), None)
            .unwrap();
        presenter
            .present(&tracker.snapshot_for_display(0.1).unwrap())
            .unwrap();
        tracker
            .record_interval(Stat::IterTime, 0.0, 0.5, Some(20), None)
            .unwrap();
        presenter
            .present(&tracker.snapshot_for_display(0.2).unwrap())
            .unwrap();

        let output = String::from_utf8(presenter.out.clone()).unwrap();
        assert_eq!(output.matches("Step (% Done)").count(), 1);
        assert!(output.contains("10 (10.00%)"));
        assert!(output.contains("20 (20.00%)"));
    }

    #[test]
    fn test_midrun_header_replays_past_lines() {
        let config = StatsConfig {
            enabled: true,
            max_history: 10,
            tracked: vec![Stat::IterTime, Stat::TestScore],
            max_iterations: 100,
        };
        let mut tracker = StatsTracker::new(config, ProcessRole::Main).unwrap();
        let mut presenter = ConsolePresenter::new(PresenterConfig { print_every: 10 }, Vec::new());

        tracker
            .record_interval(Stat::IterTime, 0.0, 0.5, Some(10), None)
            .unwrap();
        presenter
            .present(&tracker.snapshot_for_display(0.1).unwrap())
            .unwrap();

        // A key appearing mid-run forces a header rewrite.
        tracker.record_value(Stat::TestScore, 28.5, 20).unwrap();
        tracker
            .record_interval(Stat::IterTime, 0.0, 0.5, Some(20), None)
            .unwrap();
        presenter
            .present(&tracker.snapshot_for_display(0.2).unwrap())
            .unwrap();

        let output = String::from_utf8(presenter.out.clone()).unwrap();
        assert_eq!(output.matches("Step (% Done)").count(), 2);
        assert!(output.matches("Test Score").count() >= 1);
        // The pre-header data line is replayed under the new header.
        assert_eq!(output.matches("10 (10.00%)").count(), 2);
    }
}

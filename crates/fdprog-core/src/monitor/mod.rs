//! Tick loop: snapshot → tracker → report lines on the output writer.
//!
//! A tick is self-contained: acquire, process every record in order, write and
//! flush. Continuous mode then sleeps and repeats until the process is
//! interrupted or the snapshot source fails outright. Acquisition has no
//! timeout, so a hung backend stalls the loop.

use anyhow::{Context, Result};
use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::ReportFormat;
use crate::report::format_line;
use crate::size::{FsSizeLookup, SizeLookup};
use crate::snapshot::{Selector, SnapshotSource};
use crate::tracker::Tracker;

/// How many ticks a run performs. Fixed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One tick, then done.
    SingleShot,
    /// Tick, sleep `interval`, forever.
    Continuous { interval: Duration },
}

impl RunMode {
    /// `None` means single-shot.
    pub fn from_interval(interval: Option<Duration>) -> Self {
        match interval {
            Some(interval) => RunMode::Continuous { interval },
            None => RunMode::SingleShot,
        }
    }
}

/// Warn on the first empty tick and whenever a non-empty tick turns empty.
fn should_warn(last_tick_empty: Option<bool>, empty: bool) -> bool {
    empty && last_tick_empty != Some(true)
}

pub struct Monitor<S, L = FsSizeLookup> {
    source: S,
    selector: Selector,
    tracker: Tracker<L>,
    format: ReportFormat,
    started: Instant,
    last_tick_empty: Option<bool>,
}

impl<S: SnapshotSource, L: SizeLookup> Monitor<S, L> {
    pub fn new(source: S, selector: Selector, tracker: Tracker<L>, format: ReportFormat) -> Self {
        Self {
            source,
            selector,
            tracker,
            format,
            started: Instant::now(),
            last_tick_empty: None,
        }
    }

    pub fn tracker(&self) -> &Tracker<L> {
        &self.tracker
    }

    /// One tick stamped with the time since this monitor was created.
    pub fn tick<W: Write>(&mut self, out: &mut W) -> Result<usize> {
        let at = self.started.elapsed();
        self.tick_at(at, out)
    }

    /// One tick stamped `at`. Returns the number of lines written.
    pub fn tick_at<W: Write>(&mut self, at: Duration, out: &mut W) -> Result<usize> {
        let records = self
            .source
            .acquire(&self.selector)
            .with_context(|| format!("sampling descriptors for {}", self.selector))?;

        let empty = records.is_empty();
        if should_warn(self.last_tick_empty, empty) {
            tracing::warn!(selector = %self.selector, "no open descriptors matched");
        }
        self.last_tick_empty = Some(empty);

        let lines = self.tracker.observe_all(at, &records);
        for line in &lines {
            writeln!(out, "{}", format_line(line, self.format))?;
        }
        out.flush()?;

        tracing::debug!(
            records = records.len(),
            lines = lines.len(),
            tracked = self.tracker.tracked_count(),
            "tick done"
        );
        Ok(lines.len())
    }

    /// Run in `mode`. Single-shot returns after one tick; continuous only
    /// returns on a fatal error.
    pub fn run<W: Write>(&mut self, mode: RunMode, out: &mut W) -> Result<()> {
        match mode {
            RunMode::SingleShot => {
                self.tick(out)?;
                Ok(())
            }
            RunMode::Continuous { interval } => {
                tracing::info!(
                    selector = %self.selector,
                    interval_ms = interval.as_millis() as u64,
                    "monitoring continuously"
                );
                loop {
                    self.tick(out)?;
                    std::thread::sleep(interval);
                }
            }
        }
    }
}

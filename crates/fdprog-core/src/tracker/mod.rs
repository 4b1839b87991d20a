//! Per-file progress tracking.
//!
//! The first time a path is seen with a usable size, its (offset, time) pair
//! becomes the baseline. Every later observation reports the percentage of the
//! file consumed and, once enough time has passed and the offset has moved,
//! an ETA from the average rate since baseline:
//!
//! rate = (offset - baseline_offset) / (now - baseline_time)
//! eta  = (size - offset) / rate

mod eta;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::report::ProgressLine;
use crate::size::{FsSizeLookup, SizeLookup, SizeResolver};
use crate::snapshot::{AccessMode, Observation, Record};

pub use eta::Eta;

/// Default minimum time since baseline before an ETA is reported.
pub const DEFAULT_ETA_MIN_ELAPSED: Duration = Duration::from_secs(5);

/// Run-wide tracking options, fixed at start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOptions {
    /// Also track read-write descriptors.
    pub include_updates: bool,
    /// ETA is withheld until strictly more than this has elapsed since baseline.
    pub eta_min_elapsed: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            include_updates: false,
            eta_min_elapsed: DEFAULT_ETA_MIN_ELAPSED,
        }
    }
}

/// Baseline and size for one path. Never updated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedFile {
    pub baseline_offset: u64,
    pub baseline_time: Duration,
    pub size: u64,
}

pub struct Tracker<L = FsSizeLookup> {
    options: TrackerOptions,
    sizes: SizeResolver<L>,
    files: HashMap<PathBuf, TrackedFile>,
}

impl Tracker<FsSizeLookup> {
    pub fn new(options: TrackerOptions) -> Self {
        Self::with_resolver(options, SizeResolver::new())
    }
}

impl<L: SizeLookup> Tracker<L> {
    pub fn with_resolver(options: TrackerOptions, sizes: SizeResolver<L>) -> Self {
        Self {
            options,
            sizes,
            files: HashMap::new(),
        }
    }

    pub fn tracked(&self, path: &Path) -> Option<&TrackedFile> {
        self.files.get(path)
    }

    pub fn tracked_count(&self) -> usize {
        self.files.len()
    }

    /// Whether descriptors opened with `mode` are considered at all.
    pub fn accepts(&self, mode: AccessMode) -> bool {
        match mode {
            AccessMode::Read => true,
            AccessMode::Update => self.options.include_updates,
            AccessMode::Write => false,
        }
    }

    /// Process one observation taken at `at` (time since run start).
    ///
    /// Returns None when the descriptor's mode is filtered out or the file has
    /// no positive size.
    pub fn observe(&mut self, at: Duration, obs: &Observation) -> Option<ProgressLine> {
        if !self.accepts(obs.access) {
            return None;
        }

        let size = self.sizes.resolve(&obs.path).filter(|&s| s > 0)?;

        let tracked = *self.files.entry(obs.path.clone()).or_insert_with(|| {
            tracing::debug!(
                path = %obs.path.display(),
                offset = obs.offset,
                size,
                "new baseline"
            );
            TrackedFile {
                baseline_offset: obs.offset,
                baseline_time: at,
                size,
            }
        });

        let percent = obs.offset as f64 / tracked.size as f64 * 100.0;
        Some(ProgressLine {
            path: obs.path.clone(),
            percent,
            eta: self.eta(&tracked, at, obs.offset),
        })
    }

    /// Process a whole snapshot in order, dropping malformed records.
    pub fn observe_all(&mut self, at: Duration, records: &[Record]) -> Vec<ProgressLine> {
        records
            .iter()
            .filter_map(|record| match record {
                Ok(obs) => self.observe(at, obs),
                Err(bad) => {
                    tracing::debug!("discarding {}", bad);
                    None
                }
            })
            .collect()
    }

    fn eta(&self, tracked: &TrackedFile, at: Duration, offset: u64) -> Option<Eta> {
        let elapsed = at.checked_sub(tracked.baseline_time)?;
        if elapsed <= self.options.eta_min_elapsed {
            return None;
        }
        let advanced = offset.checked_sub(tracked.baseline_offset).filter(|&d| d > 0)?;
        let rate = advanced as f64 / elapsed.as_secs_f64();
        // Past the cached size: nothing left to wait for.
        Some(Eta::from_rate(tracked.size.saturating_sub(offset), rate))
    }
}

//! `fdprog watch` – sample a target's open files and print progress lines.

use anyhow::{Context, Result};
use fdprog_core::config::{Backend, FdprogConfig, ReportFormat};
use fdprog_core::monitor::{Monitor, RunMode};
use fdprog_core::snapshot::{self, Selector};
use fdprog_core::tracker::{Tracker, TrackerOptions};
use std::io;
use std::time::Duration;

use crate::cli::WatchArgs;

/// Everything a watch run needs, after merging flags over config.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WatchPlan {
    pub selector: Selector,
    pub backend: Backend,
    pub options: TrackerOptions,
    pub format: ReportFormat,
    pub mode: RunMode,
}

/// Command-line flags win; config fills the rest.
pub(crate) fn plan_watch(cfg: &FdprogConfig, args: &WatchArgs) -> Result<WatchPlan> {
    let eta_min_elapsed = Duration::try_from_secs_f64(cfg.eta_min_elapsed_secs)
        .context("eta_min_elapsed_secs must be a non-negative number")?;

    let interval = match args.interval.or(cfg.interval_secs) {
        Some(secs) if secs > 0.0 => {
            Some(Duration::try_from_secs_f64(secs).context("invalid sampling interval")?)
        }
        Some(secs) => anyhow::bail!("sampling interval must be positive, got {secs}"),
        None => None,
    };

    Ok(WatchPlan {
        selector: args.selector(),
        backend: args.backend.map(Backend::from).unwrap_or(cfg.backend),
        options: TrackerOptions {
            include_updates: args.include_updates || cfg.include_updates,
            eta_min_elapsed,
        },
        format: if args.json {
            ReportFormat::Json
        } else {
            cfg.format
        },
        mode: RunMode::from_interval(interval),
    })
}

pub fn run_watch(cfg: &FdprogConfig, args: &WatchArgs) -> Result<()> {
    let plan = plan_watch(cfg, args)?;
    tracing::info!(
        selector = %plan.selector,
        backend = ?plan.backend,
        mode = ?plan.mode,
        include_updates = plan.options.include_updates,
        "starting watch"
    );

    let source = snapshot::open_source(plan.backend)?;
    let mut monitor = Monitor::new(source, plan.selector, Tracker::new(plan.options), plan.format);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    monitor.run(plan.mode, &mut out)
}

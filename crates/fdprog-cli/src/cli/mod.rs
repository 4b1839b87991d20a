//! CLI for fdprog.

mod commands;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use fdprog_core::config::{self, Backend};
use fdprog_core::snapshot::Selector;
use std::path::PathBuf;

use commands::{run_completions, run_print_config, run_watch};

/// Top-level CLI for fdprog.
#[derive(Debug, Parser)]
#[command(name = "fdprog", version)]
#[command(about = "fdprog: progress and ETA of files a running process is reading", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Report how far a process has read through each of its open files.
    Watch(WatchArgs),

    /// Print the config file path and current values.
    Config,

    /// Generate shell completions on stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

/// What to watch and how. Exactly one of --pid, --command, --file.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["pid", "command", "file"])))]
pub struct WatchArgs {
    /// Process id to watch.
    #[arg(short, long)]
    pub pid: Option<u32>,

    /// Watch every process with this command name.
    #[arg(short, long, value_name = "NAME")]
    pub command: Option<String>,

    /// Watch every process that has this file open.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Sample every SECS seconds until interrupted (default: sample once).
    #[arg(short, long, value_name = "SECS", value_parser = parse_interval)]
    pub interval: Option<f64>,

    /// Also track files opened read-write.
    #[arg(short = 'w', long)]
    pub include_updates: bool,

    /// Descriptor source (overrides config).
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Print one JSON object per line.
    #[arg(long)]
    pub json: bool,
}

impl WatchArgs {
    pub fn selector(&self) -> Selector {
        // clap's "target" group guarantees exactly one is set.
        if let Some(pid) = self.pid {
            Selector::Pid(pid)
        } else if let Some(name) = &self.command {
            Selector::Command(name.clone())
        } else {
            Selector::File(self.file.clone().unwrap_or_default())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Procfs,
    Lsof,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Procfs => Backend::Procfs,
            BackendArg::Lsof => Backend::Lsof,
        }
    }
}

fn parse_interval(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("interval must be a positive number of seconds".to_string());
    }
    Ok(secs)
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Watch(args) => run_watch(&cfg, &args)?,
            CliCommand::Config => run_print_config(&cfg)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

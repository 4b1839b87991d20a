use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Where descriptor snapshots come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Walk `/proc/<pid>/fd` and `/proc/<pid>/fdinfo` directly.
    #[default]
    Procfs,
    /// Scrape `lsof -o0 -o` output.
    Lsof,
}

/// Output format for report lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `PATH NN.NN% [ETA H:MM:SS]`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Global configuration loaded from `~/.config/fdprog/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdprogConfig {
    /// Snapshot backend: "procfs" (default) or "lsof".
    #[serde(default)]
    pub backend: Backend,
    /// Seconds that must pass after a file's baseline before an ETA is reported.
    #[serde(default = "default_eta_min_elapsed_secs")]
    pub eta_min_elapsed_secs: f64,
    /// Also track descriptors opened read-write (e.g. in-place rewrites).
    #[serde(default)]
    pub include_updates: bool,
    /// Default sampling interval in seconds; None = single-shot unless `--interval` is given.
    #[serde(default)]
    pub interval_secs: Option<f64>,
    /// Report format: "text" (default) or "json".
    #[serde(default)]
    pub format: ReportFormat,
}

fn default_eta_min_elapsed_secs() -> f64 {
    5.0
}

impl Default for FdprogConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Procfs,
            eta_min_elapsed_secs: default_eta_min_elapsed_secs(),
            include_updates: false,
            interval_secs: None,
            format: ReportFormat::Text,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fdprog")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FdprogConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FdprogConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FdprogConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

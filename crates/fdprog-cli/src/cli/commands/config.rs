//! `fdprog config` – show where the config lives and what it says.

use anyhow::Result;
use fdprog_core::config::{self, FdprogConfig};

pub fn run_print_config(cfg: &FdprogConfig) -> Result<()> {
    let path = config::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    print!("{}", toml::to_string_pretty(cfg)?);
    if cfg.interval_secs.is_none() {
        println!("# interval_secs unset: single-shot unless --interval is given");
    }
    Ok(())
}

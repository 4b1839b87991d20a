//! CLI command handlers, one per file.

mod completions;
mod config;
mod watch;

pub use completions::run_completions;
pub use config::run_print_config;
pub use watch::run_watch;
#[cfg(test)]
pub(crate) use watch::plan_watch;

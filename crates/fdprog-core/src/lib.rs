pub mod config;
pub mod logging;

pub mod monitor;
pub mod report;
pub mod size;
pub mod snapshot;
pub mod tracker;

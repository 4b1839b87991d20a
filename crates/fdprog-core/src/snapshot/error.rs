//! Snapshot error types: fatal acquisition failures and per-record rejects.

use thiserror::Error;

/// The backend could not be queried at all. Fatal for the run.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The backend does not exist or cannot be started (no lsof binary, no /proc).
    #[error("{backend} backend unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },
    /// The backend ran but reported a failure we cannot interpret as "nothing matched".
    #[error("{backend} failed with status {status}: {stderr}")]
    Failed {
        backend: &'static str,
        status: i32,
        stderr: String,
    },
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single snapshot record that could not be turned into an observation.
/// Discarded by the tracker; never aborts a tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record ({reason}): {raw}")]
pub struct MalformedRecord {
    pub reason: &'static str,
    /// The offending input, for the debug log.
    pub raw: String,
}

impl MalformedRecord {
    pub fn new(reason: &'static str, raw: impl Into<String>) -> Self {
        Self {
            reason,
            raw: raw.into(),
        }
    }
}

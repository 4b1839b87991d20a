//! Descriptor snapshots: which files does the target have open, and where are its cursors.
//!
//! A [`SnapshotSource`] is polled once per tick and returns one [`Record`] per
//! open descriptor matching the [`Selector`]. Records that could not be turned
//! into a typed [`Observation`] come back as [`MalformedRecord`] so the caller
//! can drop them without losing the rest of the snapshot.

mod error;
pub mod lsof;
#[cfg(unix)]
pub mod procfs;

use std::fmt;
use std::path::PathBuf;

use crate::config::Backend;

pub use error::{MalformedRecord, SnapshotError};

/// What to watch. Exactly one selector per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single process id.
    Pid(u32),
    /// Every process whose command name equals this string.
    Command(String),
    /// Every descriptor, in any process, open on this path.
    File(PathBuf),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Pid(pid) => write!(f, "pid {}", pid),
            Selector::Command(name) => write!(f, "command {}", name),
            Selector::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// How a descriptor was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    /// Read-write.
    Update,
}

impl AccessMode {
    /// Mode character as printed by lsof in the FD column (`r`, `w`, `u`).
    pub fn from_flag(c: char) -> Option<Self> {
        match c {
            'r' => Some(AccessMode::Read),
            'w' => Some(AccessMode::Write),
            'u' => Some(AccessMode::Update),
            _ => None,
        }
    }
}

/// One open descriptor at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Process holding the descriptor.
    pub holder_pid: u32,
    /// Descriptor number.
    pub fd: u32,
    pub access: AccessMode,
    /// Absolute byte offset from the start of the file.
    pub offset: u64,
    pub path: PathBuf,
}

/// A snapshot entry: either a usable observation or a rejected record.
pub type Record = Result<Observation, MalformedRecord>;

/// Something that can list the open descriptors matching a selector.
///
/// `acquire` may block (it inspects another process). No timeout is applied.
pub trait SnapshotSource {
    /// Take one snapshot. A selector that matches nothing is an empty Vec, not an error;
    /// `Err` is reserved for "cannot sample at all".
    fn acquire(&mut self, selector: &Selector) -> Result<Vec<Record>, SnapshotError>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Box<S> {
    fn acquire(&mut self, selector: &Selector) -> Result<Vec<Record>, SnapshotError> {
        (**self).acquire(selector)
    }
}

/// Build the snapshot source for the configured backend.
pub fn open_source(backend: Backend) -> Result<Box<dyn SnapshotSource>, SnapshotError> {
    match backend {
        #[cfg(unix)]
        Backend::Procfs => Ok(Box::new(procfs::ProcfsSource::new())),
        #[cfg(not(unix))]
        Backend::Procfs => Err(SnapshotError::Unavailable {
            backend: "procfs",
            reason: "not supported on this platform".to_string(),
        }),
        Backend::Lsof => Ok(Box::new(lsof::LsofSource::new())),
    }
}

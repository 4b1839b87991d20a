//! Snapshot backend reading `/proc/<pid>/fd` and `/proc/<pid>/fdinfo` directly.
//!
//! Processes and descriptors can vanish between listing and reading; any such
//! race just drops that entry. Only an unreadable proc root is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use super::{AccessMode, MalformedRecord, Observation, Record, Selector, SnapshotError, SnapshotSource};

const BACKEND: &str = "procfs";

pub struct ProcfsSource {
    root: PathBuf,
}

impl ProcfsSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from a different proc root (a fake tree in tests, or a mounted container proc).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Numeric entries of the proc root, ascending.
    fn all_pids(&self) -> Result<Vec<u32>, SnapshotError> {
        let dir = fs::read_dir(&self.root).map_err(|e| SnapshotError::Unavailable {
            backend: BACKEND,
            reason: format!("cannot read {}: {}", self.root.display(), e),
        })?;
        let mut pids: Vec<u32> = dir
            .flatten()
            .filter_map(|entry| entry.file_name().to_string_lossy().parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn comm(&self, pid: u32) -> Option<String> {
        fs::read_to_string(self.root.join(pid.to_string()).join("comm"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn candidate_pids(&self, selector: &Selector) -> Result<Vec<u32>, SnapshotError> {
        match selector {
            Selector::Pid(pid) => {
                // Still fail loudly if the proc root itself is missing.
                if !self.root.is_dir() {
                    return Err(SnapshotError::Unavailable {
                        backend: BACKEND,
                        reason: format!("{} is not a directory", self.root.display()),
                    });
                }
                if self.root.join(pid.to_string()).is_dir() {
                    Ok(vec![*pid])
                } else {
                    Ok(Vec::new())
                }
            }
            Selector::Command(name) => Ok(self
                .all_pids()?
                .into_iter()
                .filter(|pid| self.comm(*pid).as_deref() == Some(name.as_str()))
                .collect()),
            Selector::File(_) => self.all_pids(),
        }
    }

    /// Open descriptors of one process whose link target is an absolute path, ascending by fd.
    fn file_descriptors(&self, pid: u32) -> Vec<(u32, PathBuf)> {
        let fd_dir = self.root.join(pid.to_string()).join("fd");
        let dir = match fs::read_dir(&fd_dir) {
            Ok(d) => d,
            Err(e) => {
                // permission denied or process gone
                tracing::debug!(pid, "skipping {}: {}", fd_dir.display(), e);
                return Vec::new();
            }
        };

        let mut fds: Vec<(u32, PathBuf)> = dir
            .flatten()
            .filter_map(|entry| {
                let fd: u32 = entry.file_name().to_string_lossy().parse().ok()?;
                let target = fs::read_link(entry.path()).ok()?;
                // pipe:[..], socket:[..], anon_inode:.. are not files
                target.is_absolute().then_some((fd, target))
            })
            .collect();
        fds.sort_unstable_by_key(|(fd, _)| *fd);
        fds
    }

    fn observe_fd(&self, pid: u32, fd: u32, path: PathBuf) -> Option<Record> {
        let info_path = self
            .root
            .join(pid.to_string())
            .join("fdinfo")
            .join(fd.to_string());
        // closed since we listed it
        let info = fs::read_to_string(&info_path).ok()?;
        Some(parse_fdinfo(&info).map(|(offset, access)| Observation {
            holder_pid: pid,
            fd,
            access,
            offset,
            path,
        }))
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for ProcfsSource {
    fn acquire(&mut self, selector: &Selector) -> Result<Vec<Record>, SnapshotError> {
        let wanted_file = match selector {
            Selector::File(path) => Some(canonical_or_same(path)),
            _ => None,
        };

        let mut records = Vec::new();
        for pid in self.candidate_pids(selector)? {
            for (fd, target) in self.file_descriptors(pid) {
                if let Some(wanted) = &wanted_file {
                    if &target != wanted {
                        continue;
                    }
                }
                if let Some(record) = self.observe_fd(pid, fd, target) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

fn canonical_or_same(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn fdinfo_field<'a>(contents: &'a str, name: &str) -> Option<&'a str> {
    contents
        .lines()
        .rfind(|line| line.starts_with(name))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim())
}

/// Parse the `pos:` (decimal) and `flags:` (octal) fields of an fdinfo file.
pub fn parse_fdinfo(contents: &str) -> Result<(u64, AccessMode), MalformedRecord> {
    let offset = fdinfo_field(contents, "pos:")
        .ok_or_else(|| MalformedRecord::new("no value 'pos'", contents))?
        .parse::<u64>()
        .map_err(|_| MalformedRecord::new("offset not absolute", contents))?;

    let flags = fdinfo_field(contents, "flags:")
        .ok_or_else(|| MalformedRecord::new("no value 'flags'", contents))
        .and_then(|v| {
            u32::from_str_radix(v, 8).map_err(|_| MalformedRecord::new("bad flags", contents))
        })?;

    let access = match (flags & libc::O_ACCMODE as u32) as libc::c_int {
        libc::O_RDONLY => AccessMode::Read,
        libc::O_WRONLY => AccessMode::Write,
        libc::O_RDWR => AccessMode::Update,
        _ => return Err(MalformedRecord::new("unknown access mode", contents)),
    };

    Ok((offset, access))
}

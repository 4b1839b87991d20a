//! Snapshot backend that scrapes `lsof` output.
//!
//! Runs `lsof -w -n -P -o0 -o` so the OFFSET column is always printed as
//! `0t<decimal>`. Each output row is parsed by [`parse_lsof_line`].

use std::path::PathBuf;
use std::process::Command;

use super::{AccessMode, MalformedRecord, Observation, Record, Selector, SnapshotError, SnapshotSource};

const BACKEND: &str = "lsof";

/// Columns before NAME: COMMAND PID USER FD TYPE DEVICE OFFSET NODE.
const LEADING_COLUMNS: usize = 8;

pub struct LsofSource {
    program: PathBuf,
}

impl LsofSource {
    pub fn new() -> Self {
        Self::with_program("lsof")
    }

    /// Use a specific lsof binary (or a stand-in script in tests).
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn selector_args(selector: &Selector) -> Vec<String> {
        match selector {
            Selector::Pid(pid) => vec!["-p".to_string(), pid.to_string()],
            // lsof matches -c as a prefix of the command name.
            Selector::Command(name) => vec!["-c".to_string(), name.clone()],
            Selector::File(path) => vec![path.to_string_lossy().into_owned()],
        }
    }
}

impl Default for LsofSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for LsofSource {
    fn acquire(&mut self, selector: &Selector) -> Result<Vec<Record>, SnapshotError> {
        let out = Command::new(&self.program)
            .args(["-w", "-n", "-P", "-o0", "-o"])
            .args(Self::selector_args(selector))
            .output()
            .map_err(|e| SnapshotError::Unavailable {
                backend: BACKEND,
                reason: format!("cannot run {}: {}", self.program.display(), e),
            })?;

        let stdout = String::from_utf8_lossy(&out.stdout);
        if !out.status.success() {
            // lsof exits 1 both for "nothing matched" and for partial results.
            match out.status.code() {
                Some(1) => {
                    if stdout.trim().is_empty() {
                        tracing::debug!(%selector, "lsof matched nothing");
                        return Ok(Vec::new());
                    }
                }
                code => {
                    return Err(SnapshotError::Failed {
                        backend: BACKEND,
                        status: code.unwrap_or(-1),
                        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                    });
                }
            }
        }

        Ok(parse_output(&stdout))
    }
}

/// Parse full lsof output (header plus rows) into records.
pub fn parse_output(output: &str) -> Vec<Record> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with("COMMAND"))
        .map(parse_lsof_line)
        .collect()
}

/// Parse one lsof row such as
/// `gzip 4242 alice 3r REG 8,1 0t1048576 131 /data/in.csv`.
///
/// Rejects rows without a numbered descriptor (`cwd`, `txt`, `mem`), rows whose
/// offset is not `0t<decimal>`, and rows whose NAME is not an absolute path.
pub fn parse_lsof_line(line: &str) -> Record {
    let mut fields = Vec::with_capacity(LEADING_COLUMNS);
    let mut rest = line.trim_start();
    for _ in 0..LEADING_COLUMNS {
        let end = match rest.find(char::is_whitespace) {
            Some(end) => end,
            None => return Err(MalformedRecord::new("too few columns", line)),
        };
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    let name = rest.trim_end();
    if name.is_empty() {
        return Err(MalformedRecord::new("missing name", line));
    }

    let holder_pid: u32 = fields[1]
        .parse()
        .map_err(|_| MalformedRecord::new("bad pid", line))?;

    let (fd, access) =
        parse_fd_column(fields[3]).ok_or_else(|| MalformedRecord::new("not a numbered descriptor", line))?;

    let offset = fields[6]
        .strip_prefix("0t")
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| MalformedRecord::new("offset not absolute", line))?;

    if !name.starts_with('/') {
        return Err(MalformedRecord::new("not a file path", line));
    }

    Ok(Observation {
        holder_pid,
        fd,
        access,
        offset,
        path: PathBuf::from(name),
    })
}

/// `3r` → (3, Read); `12u` → (12, Update); a trailing lock character is allowed.
fn parse_fd_column(col: &str) -> Option<(u32, AccessMode)> {
    let digits_end = col.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let fd = col[..digits_end].parse().ok()?;
    let mode = col[digits_end..].chars().next()?;
    Some((fd, AccessMode::from_flag(mode)?))
}

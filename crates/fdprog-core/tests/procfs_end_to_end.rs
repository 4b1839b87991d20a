//! Integration test: fake proc tree + real files on disk, driven through Monitor.
//!
//! Builds a `/proc`-shaped directory with fd symlinks and fdinfo files pointing
//! at temp files, then checks the report lines over several ticks.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fdprog_core::config::ReportFormat;
use fdprog_core::monitor::Monitor;
use fdprog_core::snapshot::procfs::ProcfsSource;
use fdprog_core::snapshot::Selector;
use fdprog_core::tracker::{Tracker, TrackerOptions};
use tempfile::{tempdir, TempDir};

struct Fixture {
    proc_root: TempDir,
    data: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            proc_root: tempdir().unwrap(),
            data: tempdir().unwrap(),
        }
    }

    fn data_file(&self, name: &str, len: usize) -> PathBuf {
        let path = self.data.path().join(name);
        fs::write(&path, vec![b'x'; len]).unwrap();
        fs::canonicalize(path).unwrap()
    }

    fn process(&self, pid: u32, comm: &str) -> PathBuf {
        let dir = self.proc_root.path().join(pid.to_string());
        fs::create_dir_all(dir.join("fd")).unwrap();
        fs::create_dir_all(dir.join("fdinfo")).unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
        dir
    }

    fn open(&self, pid: u32, fd: u32, target: &Path, flags: &str) {
        let dir = self.proc_root.path().join(pid.to_string());
        symlink(target, dir.join("fd").join(fd.to_string())).unwrap();
        self.seek(pid, fd, 0, flags);
    }

    fn seek(&self, pid: u32, fd: u32, pos: u64, flags: &str) {
        let dir = self.proc_root.path().join(pid.to_string());
        fs::write(
            dir.join("fdinfo").join(fd.to_string()),
            format!("pos:\t{pos}\nflags:\t{flags}\nmnt_id:\t25\n"),
        )
        .unwrap();
    }

    fn monitor(&self, selector: Selector, options: TrackerOptions) -> Monitor<ProcfsSource> {
        Monitor::new(
            ProcfsSource::with_root(self.proc_root.path()),
            selector,
            Tracker::new(options),
            ReportFormat::Text,
        )
    }
}

fn text(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap()
}

#[test]
fn reader_progress_over_three_ticks() {
    let fx = Fixture::new();
    let input = fx.data_file("in.csv", 1000);
    let output = fx.data_file("out.gz", 10);
    fx.process(4242, "gzip");
    fx.open(4242, 3, &input, "0100000");
    fx.open(4242, 4, &output, "0100001");

    let mut m = fx.monitor(Selector::Command("gzip".into()), TrackerOptions::default());

    let mut out = Vec::new();
    m.tick_at(Duration::from_secs(0), &mut out).unwrap();
    assert_eq!(text(out), format!("{} 0.00%\n", input.display()));

    fx.seek(4242, 3, 300, "0100000");
    let mut out = Vec::new();
    m.tick_at(Duration::from_secs(10), &mut out).unwrap();
    assert_eq!(text(out), format!("{} 30.00% ETA 0:00:23\n", input.display()));

    fx.seek(4242, 3, 600, "0100000");
    let mut out = Vec::new();
    m.tick_at(Duration::from_secs(20), &mut out).unwrap();
    // 600 bytes in 20s, 400 left -> 13.33s
    assert_eq!(text(out), format!("{} 60.00% ETA 0:00:13\n", input.display()));
}

#[test]
fn removed_file_yields_no_line_and_run_continues() {
    let fx = Fixture::new();
    let doomed = fx.data_file("doomed.bin", 500);
    let kept = fx.data_file("kept.bin", 500);
    fx.process(7, "cat");
    fx.open(7, 3, &doomed, "0100000");
    fx.open(7, 4, &kept, "0100000");
    fs::remove_file(&doomed).unwrap();

    let mut m = fx.monitor(Selector::Pid(7), TrackerOptions::default());
    let mut out = Vec::new();
    assert_eq!(m.tick_at(Duration::ZERO, &mut out).unwrap(), 1);
    assert_eq!(text(out), format!("{} 0.00%\n", kept.display()));

    // Coming back does not help: the failed lookup is cached.
    fs::write(&doomed, vec![0u8; 500]).unwrap();
    let mut out = Vec::new();
    assert_eq!(m.tick_at(Duration::from_secs(1), &mut out).unwrap(), 1);
}

#[test]
fn read_write_descriptor_needs_include_updates() {
    let fx = Fixture::new();
    let db = fx.data_file("app.db", 2000);
    fx.process(9, "sqlite3");
    fx.open(9, 5, &db, "0100002");
    fx.seek(9, 5, 500, "0100002");

    let mut m = fx.monitor(Selector::File(db.clone()), TrackerOptions::default());
    let mut out = Vec::new();
    assert_eq!(m.tick_at(Duration::ZERO, &mut out).unwrap(), 0);

    let options = TrackerOptions {
        include_updates: true,
        ..TrackerOptions::default()
    };
    let mut m = fx.monitor(Selector::File(db.clone()), options);
    let mut out = Vec::new();
    assert_eq!(m.tick_at(Duration::ZERO, &mut out).unwrap(), 1);
    assert_eq!(text(out), format!("{} 25.00%\n", db.display()));
}

#[test]
fn vanished_target_is_empty_not_fatal() {
    let fx = Fixture::new();
    fx.process(1, "init");
    let mut m = fx.monitor(Selector::Pid(31337), TrackerOptions::default());
    let mut out = Vec::new();
    assert_eq!(m.tick_at(Duration::ZERO, &mut out).unwrap(), 0);
    assert!(out.is_empty());
}

//! File size resolution with a per-run cache.
//!
//! Each distinct path is looked up once. Failures are cached too: a file that
//! was missing or unreadable on first sight stays unresolved for the run.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The single external length query behind [`SizeResolver`].
pub trait SizeLookup {
    fn file_len(&self, path: &Path) -> io::Result<u64>;
}

/// `fs::metadata`-backed lookup. Anything that is not a regular file
/// (pipe, socket, device) is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSizeLookup;

impl SizeLookup for FsSizeLookup {
    fn file_len(&self, path: &Path) -> io::Result<u64> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(meta.len())
    }
}

/// Caching resolver owned by one monitoring run.
pub struct SizeResolver<L = FsSizeLookup> {
    lookup: L,
    cache: HashMap<PathBuf, Option<u64>>,
}

impl SizeResolver<FsSizeLookup> {
    pub fn new() -> Self {
        Self::with_lookup(FsSizeLookup)
    }
}

impl Default for SizeResolver<FsSizeLookup> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: SizeLookup> SizeResolver<L> {
    pub fn with_lookup(lookup: L) -> Self {
        Self {
            lookup,
            cache: HashMap::new(),
        }
    }

    /// Size in bytes, or None if the path could not be sized. Never errors.
    pub fn resolve(&mut self, path: &Path) -> Option<u64> {
        if let Some(cached) = self.cache.get(path) {
            return *cached;
        }
        let size = match self.lookup.file_len(path) {
            Ok(len) => Some(len),
            Err(e) => {
                tracing::debug!("size of {} unresolved: {}", path.display(), e);
                None
            }
        };
        self.cache.insert(path.to_path_buf(), size);
        size
    }

    /// Number of distinct paths looked up so far.
    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    /// Counts calls; answers from a fixed table.
    struct CountingLookup {
        calls: Cell<usize>,
        sizes: HashMap<PathBuf, u64>,
    }

    impl CountingLookup {
        fn new(sizes: &[(&str, u64)]) -> Self {
            Self {
                calls: Cell::new(0),
                sizes: sizes.iter().map(|(p, s)| (PathBuf::from(p), *s)).collect(),
            }
        }
    }

    impl SizeLookup for CountingLookup {
        fn file_len(&self, path: &Path) -> io::Result<u64> {
            self.calls.set(self.calls.get() + 1);
            self.sizes
                .get(path)
                .copied()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "gone"))
        }
    }

    #[test]
    fn second_resolve_uses_cache() {
        let mut r = SizeResolver::with_lookup(CountingLookup::new(&[("/data/in.csv", 1000)]));
        assert_eq!(r.resolve(Path::new("/data/in.csv")), Some(1000));
        assert_eq!(r.resolve(Path::new("/data/in.csv")), Some(1000));
        assert_eq!(r.lookup.calls.get(), 1);
    }

    #[test]
    fn failure_is_cached_and_not_retried() {
        let mut r = SizeResolver::with_lookup(CountingLookup::new(&[]));
        assert_eq!(r.resolve(Path::new("/gone")), None);
        assert_eq!(r.resolve(Path::new("/gone")), None);
        assert_eq!(r.lookup.calls.get(), 1);
        assert_eq!(r.cached_paths(), 1);
    }

    #[test]
    fn distinct_paths_each_looked_up_once() {
        let mut r = SizeResolver::with_lookup(CountingLookup::new(&[("/a", 1), ("/b", 2)]));
        for _ in 0..3 {
            r.resolve(Path::new("/a"));
            r.resolve(Path::new("/b"));
        }
        assert_eq!(r.lookup.calls.get(), 2);
    }

    #[test]
    fn fs_lookup_sizes_regular_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.csv");
        fs::write(&path, vec![0u8; 1234]).unwrap();
        assert_eq!(FsSizeLookup.file_len(&path).unwrap(), 1234);
    }

    #[test]
    fn fs_lookup_rejects_directory_and_missing() {
        let dir = tempdir().unwrap();
        assert!(FsSizeLookup.file_len(dir.path()).is_err());
        assert!(FsSizeLookup.file_len(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn cached_size_survives_file_growth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grow.log");
        fs::write(&path, vec![0u8; 10]).unwrap();
        let mut r = SizeResolver::new();
        assert_eq!(r.resolve(&path), Some(10));
        fs::write(&path, vec![0u8; 50]).unwrap();
        assert_eq!(r.resolve(&path), Some(10));
    }
}

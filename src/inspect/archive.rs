//! The extraction archive: a flat directory of `<digest>.log` entries.
//!
//! An entry means "this content has already been extracted". Entries are
//! only ever created by moving a finished fragment in, and only ever
//! replaced wholesale. There is no eviction: the directory grows without
//! bound, and entries for deleted or renamed assets are ignored rather
//! than cleaned up. Concurrent runs against one archive are not safe and
//! must be serialized by the caller.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::debug;

use super::hash::HashIndex;
use crate::error::Result;

/// Extension given to every archive entry.
pub const ENTRY_EXTENSION: &str = "log";

/// The current project state split against the archive.
#[derive(Debug, Default)]
pub struct ArchivePartition {
    /// Asset paths whose digest has no archive entry yet.
    pub missing: Vec<PathBuf>,
    /// Entry paths for digests present in the current hash index.
    pub archived: Vec<PathBuf>,
}

/// Read-only view of the archive directory for one run.
#[derive(Debug)]
pub struct ExtractionArchive {
    dir: PathBuf,
    entries: OnceCell<HashSet<String>>,
}

impl ExtractionArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the entry for `digest` lives (whether or not it exists yet).
    pub fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", digest, ENTRY_EXTENSION))
    }

    pub fn contains(&self, digest: &str) -> Result<bool> {
        Ok(self.entries()?.contains(digest))
    }

    /// Splits the hash index into missing and archived sets.
    pub fn partition(&self, index: &HashIndex) -> Result<ArchivePartition> {
        let mut partition = ArchivePartition::default();

        for (digest, path) in index.entries() {
            if self.contains(digest)? {
                partition.archived.push(self.entry_path(digest));
            } else {
                partition.missing.push(path.to_path_buf());
            }
        }

        debug!(
            archived = partition.archived.len(),
            missing = partition.missing.len(),
            "archive partition"
        );

        Ok(partition)
    }

    /// Entry digests, listed once per run and cached after the first read.
    fn entries(&self) -> Result<&HashSet<String>> {
        let entries = self.entries.get_or_try_init(|| -> Result<HashSet<String>> {
            if !self.dir.exists() {
                debug!(dir = %self.dir.display(), "archive directory does not exist yet");
                return Ok(HashSet::new());
            }

            let mut digests = HashSet::new();
            for entry in std::fs::read_dir(&self.dir)? {
                let entry = entry?;
                if let Some(stem) = entry.path().file_stem() {
                    digests.insert(stem.to_string_lossy().into_owned());
                }
            }

            Ok(digests)
        })?;

        Ok(entries)
    }
}

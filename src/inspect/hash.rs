//! Content hashing for project asset files.
//!
//! The digest is the sole cache key: identical bytes map to the same
//! archive entry regardless of where the file lives, which is exactly the
//! dedup we want. The index is rebuilt from the live file set on every run
//! and never persisted.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

const CHUNK_SIZE: usize = 4096;
const PROGRESS_INTERVAL: usize = 500;

/// Bidirectional digest ↔ file-path mapping for one run.
///
/// When two files hash identically, the later one wins the digest→path
/// direction. That loses a path, not data: both files are served by the
/// same archive entry.
#[derive(Debug, Default)]
pub struct HashIndex {
    digest_to_path: BTreeMap<String, PathBuf>,
    path_to_digest: HashMap<PathBuf, String>,
    failures: Vec<PathBuf>,
}

impl HashIndex {
    /// Hashes every file in `files`. Unreadable files are logged and
    /// skipped; hashing of the remaining files continues.
    pub fn build(files: &[PathBuf]) -> Self {
        let mut index = Self::default();

        for (i, file) in files.iter().enumerate() {
            if i % PROGRESS_INTERVAL == 0 && !files.is_empty() {
                info!(done = i, total = files.len(), "hashing project files");
            }

            let resolved = file.canonicalize().unwrap_or_else(|_| file.clone());
            match file_digest(&resolved) {
                Ok(digest) => {
                    index.path_to_digest.insert(resolved.clone(), digest.clone());
                    index.digest_to_path.insert(digest, resolved);
                }
                Err(err) => {
                    warn!(path = %file.display(), %err, "unable to hash file");
                    index.failures.push(file.clone());
                }
            }
        }

        index
    }

    pub fn digest_for_path(&self, path: &Path) -> Option<&str> {
        let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.path_to_digest.get(&resolved).map(String::as_str)
    }

    pub fn path_for_digest(&self, digest: &str) -> Option<&Path> {
        self.digest_to_path.get(digest).map(PathBuf::as_path)
    }

    /// Digest/path pairs in digest order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.digest_to_path
            .iter()
            .map(|(digest, path)| (digest.as_str(), path.as_path()))
    }

    /// Files that could not be hashed this run.
    pub fn failures(&self) -> &[PathBuf] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.digest_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digest_to_path.is_empty()
    }
}

/// Streams the file through the hasher in fixed-size chunks. Files are
/// never loaded whole: content dirs run to tens of thousands of assets,
/// some of them large.
pub fn file_digest(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

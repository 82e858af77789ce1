//! Splits a combined multi-asset commandlet log into per-asset fragments.
//!
//! The PkgInfo commandlet prints every asset of a batch into one stream.
//! Each asset's section opens with a `Package '...' Summary` line; the
//! splitter rotates an output file on every such marker, resolves the
//! finished fragment back to its content digest through the `Filename:`
//! line, and moves it into the archive under `<digest>.log`.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::archive::ENTRY_EXTENSION;
use super::hash::HashIndex;
use crate::error::{Error, Result};

const SUMMARY_OPEN: &str = "Package '";
const SUMMARY_CLOSE: &str = "' Summary";
const FILENAME_MARKER: &str = "Filename: ";
const FRAGMENT_TEMP_NAME: &str = "_fragment.tmp";

/// What one split run produced.
#[derive(Debug, Default)]
pub struct SplitOutcome {
    /// Archive entries written, in encounter order.
    pub archived: Vec<PathBuf>,
    /// Fragments that could not be mapped back to a digest. Each is a
    /// [`Error::CacheInconsistency`]; the fragment itself is discarded.
    pub orphans: Vec<Error>,
}

impl SplitOutcome {
    fn absorb(&mut self, mut other: SplitOutcome) {
        self.archived.append(&mut other.archived);
        self.orphans.append(&mut other.orphans);
    }
}

/// Splitter over one hash index and archive directory.
pub struct LogSplitter<'a> {
    index: &'a HashIndex,
    archive_dir: &'a Path,
}

impl<'a> LogSplitter<'a> {
    pub fn new(index: &'a HashIndex, archive_dir: &'a Path) -> Self {
        Self { index, archive_dir }
    }

    /// Splits every log in `combined_logs` in order.
    pub fn split_all(&self, combined_logs: &[PathBuf]) -> Result<SplitOutcome> {
        let mut outcome = SplitOutcome::default();
        for log in combined_logs {
            outcome.absorb(self.split(log)?);
        }
        Ok(outcome)
    }

    /// Splits one combined log into archived fragments.
    pub fn split(&self, combined_log: &Path) -> Result<SplitOutcome> {
        if !combined_log.exists() {
            return Err(Error::missing(combined_log));
        }

        fs::create_dir_all(self.archive_dir)?;
        let temp_path = self.archive_dir.join(FRAGMENT_TEMP_NAME);

        let mut outcome = SplitOutcome::default();
        let mut writer: Option<BufWriter<File>> = None;

        let reader = BufReader::new(File::open(combined_log)?);
        for (line_no, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(_) => {
                    warn!(line = line_no + 1, log = %combined_log.display(), "skipping undecodable line");
                    continue;
                }
            };
            let line = line.trim_end_matches('\r');

            if is_summary_marker(line) {
                if let Some(mut open) = writer.take() {
                    // Rotate: archive the finished fragment before opening
                    // the next one.
                    open.flush()?;
                    drop(open);
                    self.finish_fragment(&temp_path, &mut outcome)?;
                }
                writer = Some(BufWriter::new(File::create(&temp_path)?));
            }

            if let Some(out) = writer.as_mut() {
                writeln!(out, "{}", line)?;
            }
            // Lines before the first marker belong to no asset and are
            // dropped.
        }

        if let Some(mut open) = writer.take() {
            open.flush()?;
            drop(open);
            self.finish_fragment(&temp_path, &mut outcome)?;
        }

        info!(
            log = %combined_log.display(),
            archived = outcome.archived.len(),
            orphans = outcome.orphans.len(),
            "split combined log"
        );

        Ok(outcome)
    }

    /// Resolves a closed fragment to its digest and moves it into the
    /// archive. Unmappable fragments are surfaced as orphans and removed.
    fn finish_fragment(&self, temp_path: &Path, outcome: &mut SplitOutcome) -> Result<()> {
        let source = declared_source(temp_path)?;

        let digest = source
            .as_deref()
            .and_then(|path| self.index.digest_for_path(path));

        match (digest, source) {
            (Some(digest), _) => {
                let target = self
                    .archive_dir
                    .join(format!("{}.{}", digest, ENTRY_EXTENSION));
                fs::rename(temp_path, &target)?;
                debug!(entry = %target.display(), "archived fragment");
                outcome.archived.push(target);
            }
            (None, source) => {
                let path = source.unwrap_or_else(|| temp_path.to_path_buf());
                let error = Error::CacheInconsistency { path };
                warn!(%error, "fragment not archived");
                outcome.orphans.push(error);
                fs::remove_file(temp_path)?;
            }
        }

        Ok(())
    }
}

fn is_summary_marker(line: &str) -> bool {
    line.contains(SUMMARY_OPEN) && line.contains(SUMMARY_CLOSE)
}

/// The absolute source path a fragment declares on its `Filename:` line.
fn declared_source(fragment: &Path) -> Result<Option<PathBuf>> {
    let reader = BufReader::new(File::open(fragment)?);

    for line in reader.lines() {
        let line = line?;
        if let Some(idx) = line.find(FILENAME_MARKER) {
            let declared = line[idx + FILENAME_MARKER.len()..].trim();
            let path = PathBuf::from(declared);
            let absolute = if path.is_absolute() {
                path
            } else {
                std::env::current_dir()?.join(path)
            };
            return Ok(Some(absolute));
        }
    }

    Ok(None)
}

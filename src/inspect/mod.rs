//! The extraction pipeline.
//!
//! One run: enumerate content files → hash them → diff against the archive
//! → recover cached fragments → run the package-info commandlet over the
//! missing files in batches → split each combined log into per-asset
//! fragments → write one JSON record per fragment.
//!
//! Everything is sequential: one commandlet process at a time, fully
//! waited on. The archive directory is the only shared resource; runs
//! against the same archive must not overlap.

pub mod archive;
pub mod hash;
pub mod splitter;

pub use archive::{ArchivePartition, ExtractionArchive};
pub use hash::HashIndex;
pub use splitter::{LogSplitter, SplitOutcome};

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::commandlet::Commandlet;
use crate::config::RunConfig;
use crate::editor::EditorContext;
use crate::error::{Error, Result};
use crate::logparse::PackageLog;
use crate::runner::ProcessRunner;

/// Name of the commandlet settings entry the pipeline runs.
pub const PACKAGE_INFO_COMMANDLET: &str = "package-info";

/// Counters from one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InspectionSummary {
    /// Content files seen this run.
    pub total_files: usize,
    /// Files served from the archive.
    pub cached: usize,
    /// Files that needed a fresh extraction.
    pub missing: usize,
    /// Files that could not be hashed.
    pub failed_hashes: usize,
    /// Commandlet invocations performed.
    pub invocations: usize,
    /// Fragments newly written to the archive.
    pub archived_fragments: usize,
    /// Fragments that could not be mapped back to a digest.
    pub orphaned_fragments: usize,
}

/// The extraction pipeline over one run config and process runner.
pub struct PackageInspection<'a> {
    config: &'a RunConfig,
    runner: &'a dyn ProcessRunner,
}

impl<'a> PackageInspection<'a> {
    pub fn new(config: &'a RunConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self { config, runner }
    }

    /// Runs the extraction pipeline end to end.
    pub fn run(&self) -> Result<InspectionSummary> {
        self.prepare_directories()?;

        let editor = EditorContext::new(self.config);
        let files = editor.content_files()?;
        info!(total = files.len(), "project content files");

        let index = HashIndex::build(&files);
        info!(hashed = index.len(), "hash mapping complete");

        let archive = ExtractionArchive::new(self.config.archive_dir());
        let partition = archive.partition(&index)?;
        info!(
            cached = partition.archived.len(),
            missing = partition.missing.len(),
            "archive partition"
        );

        self.recover_archived(&partition.archived)?;

        let mut summary = InspectionSummary {
            total_files: files.len(),
            cached: partition.archived.len(),
            missing: partition.missing.len(),
            failed_hashes: index.failures().len(),
            ..InspectionSummary::default()
        };

        let batch_size = self.config.inspection.batch_size.max(1);
        let chunks = chunk_list(&partition.missing, batch_size);

        for (chunk_no, chunk) in chunks.iter().enumerate() {
            info!(chunk = chunk_no + 1, of = chunks.len(), "starting extraction chunk");

            let combined_log = self.extract_chunk(chunk_no, chunk)?;
            summary.invocations += 1;

            let outcome = LogSplitter::new(&index, self.config.archive_dir()).split(&combined_log)?;
            self.recover_archived(&outcome.archived)?;

            summary.archived_fragments += outcome.archived.len();
            summary.orphaned_fragments += outcome.orphans.len();

            // The combined log is transient; the fragments supersede it.
            if let Err(err) = fs::remove_file(&combined_log) {
                warn!(log = %combined_log.display(), %err, "unable to remove combined log");
            }
        }

        Ok(summary)
    }

    /// Converts every fragment in the work folder into a JSON record.
    /// Returns the number of records written.
    pub fn process_archive(&self) -> Result<usize> {
        let work_dir = self.config.packages_work_dir();
        let data_dir = self.config.packages_data_dir();
        fs::create_dir_all(&data_dir)?;

        let mut fragments: Vec<PathBuf> = Vec::new();
        if work_dir.is_dir() {
            for entry in fs::read_dir(&work_dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |ext| ext == "log") {
                    fragments.push(path);
                }
            }
        }
        fragments.sort();

        let mut written = 0usize;
        for fragment in &fragments {
            let record = PackageLog::new(fragment).record()?;

            let stem = fragment
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let out_path = data_dir.join(format!("{}.json", stem));

            let mut text =
                serde_json::to_string_pretty(&record).map_err(|source| Error::Json {
                    path: out_path.clone(),
                    source,
                })?;
            text.push('\n');
            fs::write(&out_path, text)?;
            written += 1;
        }

        info!(records = written, dir = %data_dir.display(), "processed archive");
        Ok(written)
    }

    fn prepare_directories(&self) -> Result<()> {
        fs::create_dir_all(self.config.archive_dir())?;
        fs::create_dir_all(self.config.raw_logs_dir())?;
        fs::create_dir_all(self.config.packages_work_dir())?;
        fs::create_dir_all(self.config.processed_dir())?;
        fs::create_dir_all(self.config.temp_dir())?;
        Ok(())
    }

    /// Copies archive entries into the run's work folder.
    fn recover_archived(&self, entries: &[PathBuf]) -> Result<()> {
        let work_dir = self.config.packages_work_dir();
        fs::create_dir_all(&work_dir)?;

        for entry in entries {
            if !entry.exists() {
                // An entry listed earlier in the run has vanished; the next
                // run will re-extract it.
                warn!(entry = %entry.display(), "cached fragment missing on disk");
                continue;
            }

            let Some(name) = entry.file_name() else {
                continue;
            };
            fs::copy(entry, work_dir.join(name))?;
        }

        Ok(())
    }

    /// One commandlet invocation over one chunk of missing files.
    fn extract_chunk(&self, chunk_no: usize, files: &[PathBuf]) -> Result<PathBuf> {
        let log_path = self
            .config
            .temp_dir()
            .join(format!("{}_raw_package_info.log", chunk_no));

        let commandlet = Commandlet::new(self.config, PACKAGE_INFO_COMMANDLET, files.to_vec())?
            .with_log_path(log_path);

        commandlet.run(self.runner)
    }
}

/// Splits `items` into chunks of at most `size`, preserving order.
pub fn chunk_list<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

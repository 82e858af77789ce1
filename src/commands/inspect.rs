//! Inspect subcommands handler.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use upi::{PackageInspection, RunConfig, SystemRunner};

#[derive(Subcommand)]
pub enum InspectCommand {
    /// Run the extraction pipeline: hash, diff against the archive,
    /// extract missing assets, split and archive the logs.
    Run,
    /// Convert the archived fragments into per-asset JSON records.
    Process,
}

pub fn handle(project_root: &Path, command: InspectCommand) -> Result<()> {
    let config = RunConfig::load_from_project_root(project_root)
        .context("no generated config; run 'upi config generate' first")?;
    let runner = SystemRunner::new();
    let inspection = PackageInspection::new(&config, &runner);

    match command {
        InspectCommand::Run => {
            let summary = inspection.run().context("extraction pipeline failed")?;

            println!("content files:      {}", summary.total_files);
            println!("served from cache:  {}", summary.cached);
            println!("extracted:          {}", summary.missing);
            println!("engine invocations: {}", summary.invocations);
            println!("fragments archived: {}", summary.archived_fragments);
            if summary.orphaned_fragments > 0 {
                println!("orphaned fragments: {}", summary.orphaned_fragments);
            }
            if summary.failed_hashes > 0 {
                println!("unhashable files:   {}", summary.failed_hashes);
            }
            Ok(())
        }
        InspectCommand::Process => {
            let written = inspection
                .process_archive()
                .context("processing archived fragments failed")?;

            println!(
                "wrote {} records to {}",
                written,
                config.packages_data_dir().display()
            );
            Ok(())
        }
    }
}

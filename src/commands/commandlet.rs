//! Commandlet subcommands handler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use upi::{Commandlet, RunConfig, SystemRunner};

#[derive(Subcommand)]
pub enum CommandletCommand {
    /// List the commandlets available in the config.
    List,
    /// Run one commandlet.
    Run {
        /// Name of a commandlet settings entry.
        name: String,
        /// Files to pass on the commandlet's command line.
        files: Vec<PathBuf>,
    },
}

pub fn handle(project_root: &Path, command: CommandletCommand) -> Result<()> {
    let config = RunConfig::load_from_project_root(project_root)
        .context("no generated config; run 'upi config generate' first")?;

    match command {
        CommandletCommand::List => {
            for name in config.commandlets.keys() {
                println!("{}", name);
            }
            Ok(())
        }
        CommandletCommand::Run { name, files } => {
            let commandlet = Commandlet::new(&config, &name, files)?;
            let log_path = commandlet
                .run(&SystemRunner::new())
                .with_context(|| format!("commandlet '{}' failed", name))?;

            println!("log written to {}", log_path.display());
            Ok(())
        }
    }
}

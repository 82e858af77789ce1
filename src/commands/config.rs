//! Config subcommands handler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use upi::config;
use upi::RunConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Assemble the layered config from an environment file.
    Generate {
        /// Environment file with machine-local paths.
        #[arg(long)]
        environment: PathBuf,
        /// Directory of default config fragments.
        #[arg(long)]
        defaults: Option<PathBuf>,
    },
    /// Print the assembled configuration.
    Show,
}

pub fn handle(project_root: &Path, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Generate {
            environment,
            defaults,
        } => handle_generate(&environment, defaults.as_deref()),
        ConfigCommand::Show => handle_show(project_root),
    }
}

fn handle_generate(environment: &Path, defaults: Option<&Path>) -> Result<()> {
    let path = config::generate(environment, defaults).context("failed to assemble config")?;

    // Validate what we just wrote so problems surface now, not mid-run.
    RunConfig::load(&path).context("generated config does not validate")?;

    println!("generated {}", path.display());
    Ok(())
}

fn handle_show(project_root: &Path) -> Result<()> {
    let config = RunConfig::load_from_project_root(project_root)
        .context("no generated config; run 'upi config generate' first")?;

    let text = serde_json::to_string_pretty(config.raw())?;
    println!("{}", text);
    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "upi",
    version,
    about = "Unreal Package Inspector - structured asset metadata from engine commandlet logs"
)]
struct Cli {
    /// Directory holding the generated run configuration.
    #[arg(long, global = true, default_value = ".")]
    project_root: PathBuf,

    /// Verbose diagnostics.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble or display the run configuration.
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommand,
    },
    /// Extract and cache per-asset package metadata.
    Inspect {
        #[command(subcommand)]
        command: commands::inspect::InspectCommand,
    },
    /// Work with engine commandlets directly.
    Commandlet {
        #[command(subcommand)]
        command: commands::commandlet::CommandletCommand,
    },
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if debug { "upi=debug" } else { "upi=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Command::Config { command } => commands::config::handle(&cli.project_root, command),
        Command::Inspect { command } => commands::inspect::handle(&cli.project_root, command),
        Command::Commandlet { command } => commands::commandlet::handle(&cli.project_root, command),
    };

    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

//! UniGet CLI - Command-line interface
//!
//! Materializes downloaded Unity package archives into a project, picks
//! release assets by version range and inspects package manifests.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uniget::config::ConfigFile;

use commands::config::ConfigCommands;
use commands::install::InstallArgs;
use commands::manifest::ManifestArgs;
use commands::resolve::ResolveArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "uniget")]
#[command(version, about = "Unity package materializer", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Materialize a package archive into a project
    Install(InstallArgs),

    /// Pick a release asset from a saved release listing
    Resolve(ResolveArgs),

    /// Resolve a manifest and print its file classification
    Manifest(ManifestArgs),

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    uniget::logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli
        .config
        .unwrap_or_else(uniget::config::config_file_path);

    match cli.command {
        Commands::Install(args) => {
            let config = ConfigFile::load_from(&config_path)?;
            commands::install::run(args, &config)
        }
        Commands::Resolve(args) => {
            let config = ConfigFile::load_from(&config_path)?;
            commands::resolve::run(args, &config)
        }
        Commands::Manifest(args) => commands::manifest::run(args),
        Commands::Config { command } => commands::config::run(command, &config_path),
    }
}

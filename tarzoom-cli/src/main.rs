//! tarzoom CLI - pack tile pyramids and interleave plane archives.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tarzoom::config::config_file_path;

use commands::archive::{self, ArchiveCommands};
use commands::config::{self, ConfigCommands};
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tarzoom")]
#[command(version = tarzoom::VERSION)]
#[command(about = "Pack Deep Zoom pyramids into range-addressable archives", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.tarzoom/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level and mirror log output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Archive(ArchiveCommands),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);
    // `config init` must be able to replace a config file that no longer parses.
    let runner = match &cli.command {
        Commands::Config(ConfigCommands::Init { .. }) => {
            CliRunner::recovering(&config_path, cli.verbose)?
        }
        _ => CliRunner::new(Some(config_path.as_path()), cli.verbose)?,
    };

    match cli.command {
        Commands::Archive(command) => {
            runner.log_startup(command.name());
            archive::run(command, runner.config())
        }
        Commands::Config(command) => {
            runner.log_startup(command.name());
            config::run(command, &config_path, runner.config())
        }
    }
}

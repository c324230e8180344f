//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init` for locating,
//! viewing and creating the configuration file.

use std::path::Path;

use clap::Subcommand;
use tarzoom::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (file values over defaults)
    Show,

    /// Write a commented configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommands {
    /// Name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigCommands::Path => "config path",
            ConfigCommands::Show => "config show",
            ConfigCommands::Init { .. } => "config init",
        }
    }
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => run_show(path, config),
        ConfigCommands::Init { force } => run_init(path, force),
    }
}

fn run_show(path: &Path, config: &ConfigFile) -> Result<(), CliError> {
    if path.exists() {
        println!("; loaded from {}", path.display());
    } else {
        println!("; {} not found, showing defaults", path.display());
    }
    println!("[pack]");
    println!("missing_tiles = {}", config.pack.missing_tiles);
    println!("delete_sources = {}", config.pack.delete_sources);
    println!("parallel = {}", config.pack.parallel);
    println!();
    println!("[interleave]");
    println!("validate_geometry = {}", config.interleave.validate_geometry);
    println!("max_open_planes = {}", config.interleave.max_open_planes);
    println!("delete_sources = {}", config.interleave.delete_sources);
    println!();
    println!("[logging]");
    println!("file = {}", config.logging.file.display());
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    ConfigFile::default().save_to(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

//! CLI runner for common setup.
//!
//! Loads configuration and initializes logging once, before any command
//! handler runs.

use std::path::Path;

use crate::error::CliError;
use tarzoom::config::{config_file_path, ConfigFile};
use tarzoom::logging::{init_logging, LoggingConfig, LoggingGuard};
use tracing::{debug, info, warn};

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load configuration and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file; defaults to ~/.tarzoom/config.ini
    /// * `verbose` - When true, logs at debug level unless RUST_LOG says otherwise
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&path)?;

        let runner = Self::start(config, verbose)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(runner)
    }

    /// Like [`CliRunner::new`], but an unreadable or malformed config file
    /// falls back to defaults instead of failing.
    ///
    /// Used by commands that replace the config file.
    pub fn recovering(config_path: &Path, verbose: bool) -> Result<Self, CliError> {
        match ConfigFile::load_from(config_path) {
            Ok(config) => {
                let runner = Self::start(config, verbose)?;
                debug!("Loaded configuration from {}", config_path.display());
                Ok(runner)
            }
            Err(e) => {
                let runner = Self::start(ConfigFile::default(), verbose)?;
                warn!("Ignoring {}: {}", config_path.display(), e);
                Ok(runner)
            }
        }
    }

    fn start(config: ConfigFile, verbose: bool) -> Result<Self, CliError> {
        let logging_guard = init_logging(&LoggingConfig {
            log_file: config.logging.file.clone(),
            stderr: verbose,
            verbose,
        })
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tarzoom v{}: {} command", tarzoom::VERSION, command);
    }
}

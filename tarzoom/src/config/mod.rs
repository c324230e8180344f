//! User configuration from `~/.tarzoom/config.ini`.
//!
//! The file is optional; every key has a default. Command-line flags are
//! applied on top of the loaded values by the CLI.
//!
//! # Example
//!
//! ```
//! use tarzoom::config::ConfigFile;
//! use tarzoom::pyramid::MissingTilePolicy;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.pack.missing_tiles, MissingTilePolicy::Error);
//! assert!(config.interleave.validate_geometry);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{DEFAULT_LOG_FILE_NAME, DEFAULT_MAX_OPEN_PLANES};
pub use file::{config_directory, config_file_path, default_log_file, ConfigFileError};
pub use settings::{ConfigFile, InterleaveSettings, LoggingSettings, PackSettings};

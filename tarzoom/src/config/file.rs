//! Configuration file handling for ~/.tarzoom/config.ini.
//!
//! Settings structs live in [`super::settings`], defaults in
//! [`super::defaults`], parsing in [`super::parser`], and serialization in
//! [`super::writer`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::defaults::DEFAULT_LOG_FILE_NAME;
use super::settings::ConfigFile;
use crate::output::temp_file_in;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load `~/.tarzoom/config.ini`, or defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`. A missing file yields defaults; a
    /// present but malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match path.try_exists() {
            Ok(true) => super::parser::parse_ini(&Ini::load_from_file(path)?),
            Ok(false) => Ok(Self::default()),
            Err(e) => Err(ConfigFileError::ReadError(ini::Error::Io(e))),
        }
    }

    /// Write the commented INI form of this configuration to `path`.
    ///
    /// The file is replaced atomically, so a concurrent reader sees either
    /// the old or the new contents.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(ConfigFileError::DirectoryError)?;

        let mut temp = temp_file_in(dir).map_err(|e| ConfigFileError::WriteError(e.to_string()))?;
        temp.write_all(super::writer::to_config_string(self).as_bytes())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))?;
        temp.persist(path)
            .map_err(|e| ConfigFileError::WriteError(e.error.to_string()))?;
        Ok(())
    }
}

/// Get the path to the config directory (~/.tarzoom).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tarzoom")
}

/// Get the path to the config file (~/.tarzoom/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Get the default log file (~/.tarzoom/logs/tarzoom.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join(DEFAULT_LOG_FILE_NAME)
}

//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tarzoom::config::ConfigFileError;
use tarzoom::TarzoomError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Packing, interleaving or reading an archive failed
    Archive(TarzoomError),
    /// Arguments are inconsistent in a way clap cannot express
    Usage(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Archive(TarzoomError::MissingTile { .. }) => {
                eprintln!();
                eprintln!("Pass --missing-tiles empty (or set [pack] missing_tiles = empty)");
                eprintln!("to pack absent cells as zero-length ranges.");
            }
            CliError::Archive(TarzoomError::GeometryMismatch { .. }) => {
                eprintln!();
                eprintln!("Planes must come from pyramids with identical geometry.");
                eprintln!("Use --no-validate to interleave them anyway.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Archive(e) => write!(f, "{}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Archive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TarzoomError> for CliError {
    fn from(e: TarzoomError) -> Self {
        CliError::Archive(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_archive_error_display_is_unwrapped() {
        let err: CliError = TarzoomError::NoPlanes("scan".into()).into();
        assert_eq!(err.to_string(), "No planes to process in scan");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err: CliError = ConfigFileError::InvalidValue {
            section: "pack".into(),
            key: "parallel".into(),
            value: "maybe".into(),
            reason: "must be true or false".into(),
        }
        .into();
        assert!(err.to_string().starts_with("Configuration error: "));
        assert!(err.to_string().contains("pack.parallel"));
    }
}

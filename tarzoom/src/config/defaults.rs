//! Default values for every configuration key.

use super::file::default_log_file;
use super::settings::*;
use crate::pyramid::MissingTilePolicy;

pub use crate::interleave::DEFAULT_MAX_OPEN_PLANES;

/// File name of the log inside `~/.tarzoom/logs`.
pub const DEFAULT_LOG_FILE_NAME: &str = "tarzoom.log";

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            missing_tiles: MissingTilePolicy::Error,
            delete_sources: false,
            parallel: false,
        }
    }
}

impl Default for InterleaveSettings {
    fn default() -> Self {
        Self {
            validate_geometry: true,
            max_open_planes: DEFAULT_MAX_OPEN_PLANES,
            delete_sources: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

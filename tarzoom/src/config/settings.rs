//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

use crate::batch::FolderPackOptions;
use crate::interleave::InterleaveOptions;
use crate::pack::PackOptions;
use crate::pyramid::MissingTilePolicy;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub pack: PackSettings,
    pub interleave: InterleaveSettings,
    pub logging: LoggingSettings,
}

/// `[pack]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSettings {
    /// What to do with grid cells that have no tile file.
    pub missing_tiles: MissingTilePolicy,
    /// Remove the descriptor and level directory after packing.
    pub delete_sources: bool,
    /// Pack planes concurrently in folder mode.
    pub parallel: bool,
}

/// `[interleave]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleaveSettings {
    /// Compare pyramid geometry across planes before merging.
    pub validate_geometry: bool,
    /// Above this many planes, blobs are reopened per read.
    pub max_open_planes: usize,
    /// Remove the per-plane archives after a folder interleave.
    pub delete_sources: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path.
    pub file: PathBuf,
}

impl PackSettings {
    pub fn pack_options(&self) -> PackOptions {
        PackOptions {
            missing_tiles: self.missing_tiles,
            delete_sources: self.delete_sources,
        }
    }

    pub fn folder_options(&self) -> FolderPackOptions {
        FolderPackOptions {
            pack: self.pack_options(),
            parallel: self.parallel,
        }
    }
}

impl InterleaveSettings {
    pub fn interleave_options(&self) -> InterleaveOptions {
        InterleaveOptions {
            validate_geometry: self.validate_geometry,
            max_open_planes: self.max_open_planes,
            delete_sources: self.delete_sources,
        }
    }
}

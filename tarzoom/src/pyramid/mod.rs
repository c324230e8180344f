//! Directory-based tile pyramids as produced by a Deep Zoom tiler.
//!
//! Layout on disk:
//!
//! ```text
//! plane_0.dzi
//! plane_0_files/
//!     0/0_0.jpg
//!     1/0_0.jpg
//!     ...
//!     12/0_0.jpg 1_0.jpg ... 15_11.jpg
//! ```
//!
//! [`PyramidSource::scan`] reads the tree once, recording every tile's size,
//! and returns the levels in ascending numeric order.

mod level;
mod tile;

pub use level::{MissingTilePolicy, TileGridLevel, MAX_LEVEL_CELLS};
pub use tile::{parse_tile_name, TileFile, TileName};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::descriptor::Descriptor;
use crate::error::{TarzoomError, TarzoomResult};
use crate::output::with_suffix;

/// Extension of the pyramid descriptor.
pub const DESCRIPTOR_EXTENSION: &str = "dzi";

/// Suffix appended to the basename for the level directory.
pub const LEVELS_SUFFIX: &str = "_files";

/// Location of a pyramid on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidSource {
    pub descriptor: PathBuf,
    pub levels_dir: PathBuf,
}

/// A fully scanned pyramid, ready to pack.
#[derive(Debug, Clone)]
pub struct ScannedPyramid {
    pub descriptor: Descriptor,
    /// Levels in ascending order.
    pub levels: Vec<TileGridLevel>,
    /// Common tile extension.
    pub format: String,
}

impl ScannedPyramid {
    /// Total number of grid cells across all levels.
    pub fn cell_count(&self) -> usize {
        self.levels.iter().map(TileGridLevel::cell_count).sum()
    }

    /// Total size of all tiles in bytes.
    pub fn byte_len(&self) -> u64 {
        self.levels.iter().map(TileGridLevel::byte_len).sum()
    }
}

impl PyramidSource {
    /// `<basename>.dzi` and `<basename>_files/`.
    pub fn from_basename(basename: &Path) -> Self {
        let mut levels = basename.as_os_str().to_owned();
        levels.push(LEVELS_SUFFIX);
        Self {
            descriptor: with_suffix(basename, DESCRIPTOR_EXTENSION),
            levels_dir: PathBuf::from(levels),
        }
    }

    /// Read the descriptor and every level directory.
    ///
    /// Level directories must be named with unsigned integers and are sorted
    /// by value, so level `10` follows level `9`. Hidden entries are ignored;
    /// any other file that is not named `<col>_<row>.<ext>` is an error.
    /// Tile positions must lie within the tile grid of the image size the
    /// descriptor declares.
    pub fn scan(&self, policy: MissingTilePolicy) -> TarzoomResult<ScannedPyramid> {
        let descriptor = Descriptor::load(&self.descriptor)?;

        let mut level_dirs = self.level_directories()?;
        if level_dirs.is_empty() {
            return Err(TarzoomError::NoLevels(self.levels_dir.clone()));
        }
        level_dirs.sort_by_key(|(level, _)| *level);

        let extent = descriptor.grid_extent();
        let mut format: Option<String> = None;
        let mut levels = Vec::with_capacity(level_dirs.len());

        for (level, dir) in level_dirs {
            let mut tiles = Vec::new();
            for (name, path) in read_tile_entries(&dir)? {
                if format.as_deref().is_some_and(|f| f != name.extension) {
                    return Err(TarzoomError::MixedFormats {
                        expected: format.unwrap_or_default(),
                        found: name.extension,
                    });
                }
                format.get_or_insert_with(|| name.extension.clone());

                let size = fs::metadata(&path)
                    .map_err(|e| TarzoomError::read(&path, e))?
                    .len();
                tiles.push(TileFile {
                    col: name.col,
                    row: name.row,
                    path,
                    size,
                });
            }
            levels.push(TileGridLevel::build(level, tiles, policy, extent)?);
        }

        let format = format
            .or_else(|| descriptor.format.clone())
            .unwrap_or_else(|| "jpg".to_string());

        Ok(ScannedPyramid {
            descriptor,
            levels,
            format,
        })
    }

    fn level_directories(&self) -> TarzoomResult<Vec<(u32, PathBuf)>> {
        let entries = fs::read_dir(&self.levels_dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TarzoomError::LevelDirectoryNotFound(self.levels_dir.clone()),
            _ => TarzoomError::read(&self.levels_dir, e),
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TarzoomError::read(&self.levels_dir, e))?;
            let path = entry.path();
            if tile::is_hidden(&path) || !path.is_dir() {
                continue;
            }
            let level = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| TarzoomError::InvalidLevelName(path.clone()))?;
            dirs.push((level, path));
        }
        Ok(dirs)
    }
}

fn read_tile_entries(dir: &Path) -> TarzoomResult<Vec<(TileName, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| TarzoomError::read(dir, e))?;

    let mut tiles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TarzoomError::read(dir, e))?;
        let path = entry.path();
        if tile::is_hidden(&path) || !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_tile_name)
            .ok_or_else(|| TarzoomError::InvalidTileName(path.clone()))?;
        tiles.push((name, path));
    }
    Ok(tiles)
}

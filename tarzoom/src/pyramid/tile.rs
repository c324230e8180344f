//! Tile filename parsing.
//!
//! Deep Zoom tilers name tiles `<col>_<row>.<ext>` inside the level
//! directory. Only the trailing part of the name is significant, so names
//! such as `tile_3_7.jpeg` still parse as column 3, row 7.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Position and codec parsed from a tile filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileName {
    pub col: u32,
    pub row: u32,
    /// Lowercased file extension, e.g. `jpg`.
    pub extension: String,
}

/// A tile file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFile {
    pub col: u32,
    pub row: u32,
    pub path: PathBuf,
    /// File size in bytes, read once during the scan.
    pub size: u64,
}

fn tile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // (\d+) col, (\d+) row, extension
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])(\d+)_(\d+)\.([A-Za-z0-9]+)$").expect("valid tile pattern")
    })
}

/// Parse a tile filename.
///
/// Returns `None` when the name does not end in `<col>_<row>.<ext>` or the
/// numbers overflow `u32`.
///
/// ```
/// use tarzoom::pyramid::parse_tile_name;
///
/// let tile = parse_tile_name("12_3.JPG").unwrap();
/// assert_eq!((tile.col, tile.row), (12, 3));
/// assert_eq!(tile.extension, "jpg");
/// assert!(parse_tile_name("thumbnail.jpg").is_none());
/// ```
pub fn parse_tile_name(name: &str) -> Option<TileName> {
    let captures = tile_pattern().captures(name)?;
    Some(TileName {
        col: captures[1].parse().ok()?,
        row: captures[2].parse().ok()?,
        extension: captures[3].to_ascii_lowercase(),
    })
}

/// Whether a directory entry should be skipped during the scan.
pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

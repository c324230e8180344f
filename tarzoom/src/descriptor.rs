//! Deep Zoom descriptor (`.dzi`) parsing.
//!
//! A descriptor looks like:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
//!   Format="jpg" Overlap="1" TileSize="256">
//!   <Size Height="3000" Width="4000"/>
//! </Image>
//! ```
//!
//! Only the attributes are needed, so they are located with anchored
//! attribute patterns instead of a full XML parse.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{TarzoomError, TarzoomResult};

/// Tile side length assumed when the descriptor omits `TileSize`.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Overlap assumed when the descriptor omits `Overlap`.
pub const DEFAULT_OVERLAP: u32 = 0;

/// Attributes read from a pyramid descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Full-resolution image width in pixels.
    pub width: u32,
    /// Full-resolution image height in pixels.
    pub height: u32,
    /// Tile side length in pixels.
    pub tile_size: u32,
    /// Pixels of overlap between neighbouring tiles.
    pub overlap: u32,
    /// Codec tag declared by the tiler, if any.
    pub format: Option<String>,
}

fn attribute_pattern(name: &str) -> Regex {
    // Attribute names are fixed literals; the pattern always compiles.
    Regex::new(&format!(r#"\b{}\s*=\s*"([^"]*)""#, name)).expect("valid attribute pattern")
}

fn width_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("Width"))
}

fn height_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("Height"))
}

fn tile_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("TileSize"))
}

fn overlap_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("Overlap"))
}

fn format_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("Format"))
}

impl Descriptor {
    /// Read and parse the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// - [`TarzoomError::DescriptorNotFound`] if the file does not exist
    /// - [`TarzoomError::DescriptorParse`] if width or height is missing or
    ///   not an unsigned integer
    pub fn load(path: &Path) -> TarzoomResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TarzoomError::DescriptorNotFound(path.to_path_buf()),
            _ => TarzoomError::read(path, e),
        })?;

        Self::parse(&contents).map_err(|reason| TarzoomError::DescriptorParse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse descriptor text.
    ///
    /// Returns a human-readable reason on failure; [`Descriptor::load`] adds
    /// the path.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let width = required_u32(contents, width_pattern(), "Width")?;
        let height = required_u32(contents, height_pattern(), "Height")?;
        let tile_size =
            optional_u32(contents, tile_size_pattern(), "TileSize")?.unwrap_or(DEFAULT_TILE_SIZE);
        if tile_size == 0 {
            return Err("TileSize attribute is 0".to_string());
        }
        let overlap =
            optional_u32(contents, overlap_pattern(), "Overlap")?.unwrap_or(DEFAULT_OVERLAP);
        let format = format_pattern()
            .captures(contents)
            .map(|c| c[1].trim().to_string())
            .filter(|f| !f.is_empty());

        Ok(Self {
            width,
            height,
            tile_size,
            overlap,
            format,
        })
    }

    /// Columns and rows of the full-resolution level's tile grid.
    ///
    /// No level of the pyramid has a wider or taller grid. Level 0 always
    /// has one tile, so each dimension is at least 1.
    pub fn grid_extent(&self) -> (u32, u32) {
        let tile_size = self.tile_size.max(1);
        (
            self.width.div_ceil(tile_size).max(1),
            self.height.div_ceil(tile_size).max(1),
        )
    }
}

fn optional_u32(contents: &str, pattern: &Regex, name: &str) -> Result<Option<u32>, String> {
    match pattern.captures(contents) {
        None => Ok(None),
        Some(captures) => {
            let raw = captures[1].trim();
            raw.parse::<u32>()
                .map(Some)
                .map_err(|_| format!("{} attribute '{}' is not an unsigned integer", name, raw))
        }
    }
}

fn required_u32(contents: &str, pattern: &Regex, name: &str) -> Result<u32, String> {
    optional_u32(contents, pattern, name)?.ok_or_else(|| format!("no {} attribute", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DZI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
  Format="jpg"
  Overlap="1"
  TileSize="254"
  >
  <Size
    Height="3000"
    Width="4000"
  />
</Image>"#;

    #[test]
    fn test_parse_full_descriptor() {
        let d = Descriptor::parse(DZI).unwrap();
        assert_eq!(d.width, 4000);
        assert_eq!(d.height, 3000);
        assert_eq!(d.tile_size, 254);
        assert_eq!(d.overlap, 1);
        assert_eq!(d.format.as_deref(), Some("jpg"));
    }

    #[test]
    fn test_parse_minimal_uses_defaults() {
        let d = Descriptor::parse(r#"<Size Width="10" Height="20"/>"#).unwrap();
        assert_eq!(d.width, 10);
        assert_eq!(d.height, 20);
        assert_eq!(d.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(d.overlap, DEFAULT_OVERLAP);
        assert!(d.format.is_none());
    }

    #[test]
    fn test_tile_size_does_not_match_size_element() {
        // `Size` must not satisfy the `TileSize` pattern and vice versa.
        let d = Descriptor::parse(r#"<Image TileSize="512"><Size Width="1" Height="2"/></Image>"#)
            .unwrap();
        assert_eq!(d.tile_size, 512);
    }

    #[test]
    fn test_missing_height_is_error() {
        let err = Descriptor::parse(r#"<Size Width="10"/>"#).unwrap_err();
        assert!(err.contains("Height"));
    }

    #[test]
    fn test_non_numeric_width_is_error() {
        let err = Descriptor::parse(r#"<Size Width="wide" Height="2"/>"#).unwrap_err();
        assert!(err.contains("wide"));
    }

    #[test]
    fn test_zero_tile_size_is_error() {
        let err = Descriptor::parse(r#"<Image TileSize="0"><Size Width="1" Height="2"/></Image>"#)
            .unwrap_err();
        assert!(err.contains("TileSize"));
    }

    #[test]
    fn test_grid_extent() {
        let d = Descriptor::parse(DZI).unwrap();
        assert_eq!(d.grid_extent(), (16, 12));

        let exact = Descriptor::parse(r#"<Size Width="512" Height="256"/>"#).unwrap();
        assert_eq!(exact.grid_extent(), (2, 1));

        let empty = Descriptor::parse(r#"<Size Width="0" Height="0"/>"#).unwrap();
        assert_eq!(empty.grid_extent(), (1, 1));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Descriptor::load(&dir.path().join("plane_0.dzi")).unwrap_err();
        assert!(matches!(err, TarzoomError::DescriptorNotFound(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane_0.dzi");
        fs::write(&path, "<Image/>").unwrap();

        let err = Descriptor::load(&path).unwrap_err();
        match err {
            TarzoomError::DescriptorParse { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("Width"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

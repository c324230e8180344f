//! Error types for packing, interleaving and reading tarzoom archives.
//!
//! Every failure is fatal for the run that produced it. Variants are grouped
//! by what went wrong: an input is absent, an input is malformed, the input
//! violates a structural requirement, or the storage layer failed.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for tarzoom operations.
pub type TarzoomResult<T> = Result<T, TarzoomError>;

/// Errors produced by the packer, the interleaver and the archive reader.
#[derive(Debug, Error)]
pub enum TarzoomError {
    // ------------------------------------------------------------------
    // Input absent
    // ------------------------------------------------------------------
    /// The pyramid descriptor (`.dzi`) does not exist.
    #[error("Descriptor not found: {0}")]
    DescriptorNotFound(PathBuf),

    /// The `<basename>_files` level directory does not exist.
    #[error("Level directory not found: {0}")]
    LevelDirectoryNotFound(PathBuf),

    /// No planes were supplied or discovered.
    #[error("No planes to process in {0}")]
    NoPlanes(String),

    /// A plane index has no sibling blob.
    #[error("Plane index {index} has no matching blob {blob}")]
    MissingPlaneBlob { index: PathBuf, blob: PathBuf },

    // ------------------------------------------------------------------
    // Input malformed
    // ------------------------------------------------------------------
    /// The descriptor lacks a parsable width or height.
    #[error("Failed to parse descriptor {path}: {reason}")]
    DescriptorParse { path: PathBuf, reason: String },

    /// A level directory name is not an unsigned integer.
    #[error("Level directory name is not a number: {0}")]
    InvalidLevelName(PathBuf),

    /// A tile filename does not end in `<col>_<row>.<ext>`.
    #[error("Tile filename does not match '<col>_<row>.<ext>': {0}")]
    InvalidTileName(PathBuf),

    /// An index file is not valid JSON or lacks a required field.
    #[error("Failed to parse index {path}: {source}")]
    IndexParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An index is well-formed JSON but breaks an offsets invariant.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// A blob's size disagrees with the final offset of its index.
    #[error("Blob {path} is {actual} bytes, index expects {expected}")]
    BlobLengthMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    // ------------------------------------------------------------------
    // Structural violations
    // ------------------------------------------------------------------
    /// The pyramid contains no level directories.
    #[error("Pyramid has no levels: {0}")]
    NoLevels(PathBuf),

    /// A level directory contains no tiles.
    #[error("Level {level} contains no tiles")]
    EmptyLevel { level: u32 },

    /// A cell of a level's dense grid has no tile file.
    #[error("Level {level} is missing tile {col}_{row} (grid is {cols}x{rows})")]
    MissingTile {
        level: u32,
        col: u32,
        row: u32,
        cols: u32,
        rows: u32,
    },

    /// A tile position lies beyond the tile grid of the full-resolution image.
    #[error("Level {level} tile {col}_{row} is outside the {cols}x{rows} tile grid of the image")]
    TileOutsideGrid {
        level: u32,
        col: u32,
        row: u32,
        cols: u32,
        rows: u32,
    },

    /// A level's dense grid has more cells than can be packed.
    #[error("Level {level} grid of {cols}x{rows} tiles exceeds the limit of {limit} cells")]
    GridTooLarge {
        level: u32,
        cols: u64,
        rows: u64,
        limit: u64,
    },

    /// Two files in one level map to the same cell.
    #[error("Level {level} has more than one file for tile {col}_{row}")]
    DuplicateTile { level: u32, col: u32, row: u32 },

    /// Tiles use more than one file extension.
    #[error("Pyramid mixes tile formats '{expected}' and '{found}'")]
    MixedFormats { expected: String, found: String },

    /// Plane data ran out, or planes disagree on tile count.
    #[error("Plane {plane} length mismatch: {reason}")]
    PlaneLengthMismatch { plane: usize, reason: String },

    /// Planes disagree on pyramid geometry.
    #[error("Plane {plane} {field} is {found}, expected {expected}")]
    GeometryMismatch {
        plane: usize,
        field: &'static str,
        expected: String,
        found: String,
    },

    /// A tile or group position is past the end of the archive.
    #[error("Position {position} out of range (archive has {count})")]
    OutOfRange { position: usize, count: usize },

    /// The operation needs an interleaved archive but got a single-plane one,
    /// or the other way round.
    #[error("Archive mode mismatch: {0}")]
    ModeMismatch(String),

    // ------------------------------------------------------------------
    // I/O failures
    // ------------------------------------------------------------------
    /// Reading a file or directory failed.
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing, persisting or removing a file failed.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TarzoomError {
    /// Wrap an I/O error raised while reading `path`.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TarzoomError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Wrap an I/O error raised while writing `path`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TarzoomError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a structural violation of the input data.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TarzoomError::NoLevels(_)
                | TarzoomError::EmptyLevel { .. }
                | TarzoomError::MissingTile { .. }
                | TarzoomError::TileOutsideGrid { .. }
                | TarzoomError::GridTooLarge { .. }
                | TarzoomError::DuplicateTile { .. }
                | TarzoomError::MixedFormats { .. }
                | TarzoomError::PlaneLengthMismatch { .. }
                | TarzoomError::GeometryMismatch { .. }
        )
    }
}

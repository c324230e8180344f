//! One zoom level as a dense grid of tiles.

use std::collections::BTreeMap;

use crate::error::{TarzoomError, TarzoomResult};

use super::tile::TileFile;

/// How to treat grid cells that have no tile file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTilePolicy {
    /// Abort with [`TarzoomError::MissingTile`].
    #[default]
    Error,
    /// Record a zero-length range for the cell.
    Empty,
}

impl MissingTilePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingTilePolicy::Error => "error",
            MissingTilePolicy::Empty => "empty",
        }
    }
}

impl std::str::FromStr for MissingTilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(MissingTilePolicy::Error),
            "empty" => Ok(MissingTilePolicy::Empty),
            other => Err(format!("expected 'error' or 'empty', got '{}'", other)),
        }
    }
}

impl std::fmt::Display for MissingTilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound on the cells of one level's grid, holes included.
pub const MAX_LEVEL_CELLS: u64 = 1 << 24;

/// A zoom level laid out as `columns × rows` cells in row-major order.
///
/// Cell `col + columns * row` holds the tile at `(col, row)`, or `None` for
/// a hole. The grid extent is derived from the largest column and row seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGridLevel {
    pub level: u32,
    pub columns: u32,
    pub rows: u32,
    cells: Vec<Option<TileFile>>,
}

impl TileGridLevel {
    /// Lay out `tiles` into a dense grid.
    ///
    /// `extent` is the `(columns, rows)` tile grid of the full-resolution
    /// image; no level may place a tile outside it.
    ///
    /// # Errors
    ///
    /// - [`TarzoomError::EmptyLevel`] if `tiles` is empty
    /// - [`TarzoomError::TileOutsideGrid`] if a tile lies beyond `extent`
    /// - [`TarzoomError::GridTooLarge`] if the grid exceeds [`MAX_LEVEL_CELLS`]
    /// - [`TarzoomError::DuplicateTile`] if two tiles share a position
    /// - [`TarzoomError::MissingTile`] for the first hole in row-major order
    ///   when `policy` is [`MissingTilePolicy::Error`]
    pub fn build(
        level: u32,
        tiles: Vec<TileFile>,
        policy: MissingTilePolicy,
        extent: (u32, u32),
    ) -> TarzoomResult<Self> {
        let (max_cols, max_rows) = extent;
        if let Some(outside) = tiles.iter().find(|t| t.col >= max_cols || t.row >= max_rows) {
            return Err(TarzoomError::TileOutsideGrid {
                level,
                col: outside.col,
                row: outside.row,
                cols: max_cols,
                rows: max_rows,
            });
        }

        let max_col = tiles.iter().map(|t| t.col).max();
        let max_row = tiles.iter().map(|t| t.row).max();
        let (Some(max_col), Some(max_row)) = (max_col, max_row) else {
            return Err(TarzoomError::EmptyLevel { level });
        };

        // Both fit in u32: every position is below the extent.
        let columns = max_col + 1;
        let rows = max_row + 1;

        let cell_count = u64::from(columns) * u64::from(rows);
        if cell_count > MAX_LEVEL_CELLS {
            return Err(TarzoomError::GridTooLarge {
                level,
                cols: u64::from(columns),
                rows: u64::from(rows),
                limit: MAX_LEVEL_CELLS,
            });
        }

        let mut by_position = BTreeMap::new();
        for tile in tiles {
            let key = (tile.row, tile.col);
            if by_position.contains_key(&key) {
                return Err(TarzoomError::DuplicateTile {
                    level,
                    col: tile.col,
                    row: tile.row,
                });
            }
            by_position.insert(key, tile);
        }

        let mut cells = Vec::with_capacity(cell_count as usize);
        for row in 0..rows {
            for col in 0..columns {
                let cell = by_position.remove(&(row, col));
                if cell.is_none() && policy == MissingTilePolicy::Error {
                    return Err(TarzoomError::MissingTile {
                        level,
                        col,
                        row,
                        cols: columns,
                        rows,
                    });
                }
                cells.push(cell);
            }
        }

        Ok(Self {
            level,
            columns,
            rows,
            cells,
        })
    }

    /// Number of cells, present or not.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of cells without a tile.
    pub fn hole_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Cells in pack order.
    pub fn cells(&self) -> impl Iterator<Item = Option<&TileFile>> {
        self.cells.iter().map(Option::as_ref)
    }

    /// Sum of the sizes of present tiles.
    pub fn byte_len(&self) -> u64 {
        self.cells.iter().flatten().map(|t| t.size).sum()
    }
}

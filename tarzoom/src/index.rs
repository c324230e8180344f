//! The `.tzi` index record.
//!
//! An index is a flat JSON object:
//!
//! ```json
//! {"tilesize":256,"overlap":0,"format":"jpg","width":4000,"height":3000,
//!  "nlevels":13,"offsets":[0,5213,10877]}
//! ```
//!
//! Interleaved indexes add `"mode":"interleaved"` and `"stride":N`; both keys
//! are omitted for single-plane archives.

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TarzoomError, TarzoomResult};

/// `mode` value written by the interleaver.
pub const INTERLEAVED_MODE: &str = "interleaved";

/// Metadata and offsets for one packed archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyramidIndex {
    #[serde(rename = "tilesize")]
    pub tile_size: u32,
    pub overlap: u32,
    pub format: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "nlevels")]
    pub levels: u32,
    /// Cumulative byte offsets; range `k` is `offsets[k]..offsets[k + 1]`.
    pub offsets: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride: Option<u32>,
}

impl PyramidIndex {
    /// Read an index from disk and validate its offsets.
    pub fn load(path: &Path) -> TarzoomResult<Self> {
        let bytes = fs::read(path).map_err(|e| TarzoomError::read(path, e))?;
        let index: PyramidIndex =
            serde_json::from_slice(&bytes).map_err(|e| TarzoomError::IndexParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        index.validate()?;
        Ok(index)
    }

    /// Serialize to the compact JSON form stored in `.tzi` files.
    pub fn to_json(&self) -> Vec<u8> {
        // A struct of integers, strings and a Vec cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Whether this index describes an interleaved archive.
    pub fn is_interleaved(&self) -> bool {
        self.mode.as_deref() == Some(INTERLEAVED_MODE)
    }

    /// Number of planes per tile group (1 for single-plane archives).
    pub fn stride(&self) -> usize {
        self.stride.map(|s| s as usize).unwrap_or(1)
    }

    /// Number of addressable ranges (tiles, or plane copies of tiles).
    pub fn range_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of tile positions; equals `range_count` for single-plane
    /// archives and `range_count / stride` for interleaved ones.
    pub fn tile_count(&self) -> usize {
        self.range_count() / self.stride().max(1)
    }

    /// Total blob length implied by the offsets.
    pub fn blob_len(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Byte length of every range, in order.
    pub fn sizes(&self) -> Vec<u64> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Byte range `k`.
    pub fn range(&self, k: usize) -> TarzoomResult<Range<u64>> {
        if k >= self.range_count() {
            return Err(TarzoomError::OutOfRange {
                position: k,
                count: self.range_count(),
            });
        }
        Ok(self.offsets[k]..self.offsets[k + 1])
    }

    /// Byte range of every plane's copy of tile position `p`.
    pub fn group_range(&self, p: usize) -> TarzoomResult<Range<u64>> {
        let n = self.stride();
        if p >= self.tile_count() {
            return Err(TarzoomError::OutOfRange {
                position: p,
                count: self.tile_count(),
            });
        }
        Ok(self.offsets[p * n]..self.offsets[(p + 1) * n])
    }

    /// Byte range of plane `j`'s copy of tile position `p`.
    pub fn plane_range(&self, p: usize, j: usize) -> TarzoomResult<Range<u64>> {
        let n = self.stride();
        if j >= n {
            return Err(TarzoomError::OutOfRange {
                position: j,
                count: n,
            });
        }
        if p >= self.tile_count() {
            return Err(TarzoomError::OutOfRange {
                position: p,
                count: self.tile_count(),
            });
        }
        self.range(p * n + j)
    }

    /// Check the offsets invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TarzoomError::InvalidIndex`] when offsets are empty, do not
    /// start at zero, decrease, or (for interleaved indexes) do not divide
    /// into whole tile groups.
    pub fn validate(&self) -> TarzoomResult<()> {
        match self.offsets.first() {
            None => return Err(TarzoomError::InvalidIndex("offsets are empty".into())),
            Some(&first) if first != 0 => {
                return Err(TarzoomError::InvalidIndex(format!(
                    "offsets start at {} instead of 0",
                    first
                )))
            }
            Some(_) => {}
        }

        if let Some(k) = self.offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(TarzoomError::InvalidIndex(format!(
                "offset {} ({}) is smaller than offset {} ({})",
                k + 1,
                self.offsets[k + 1],
                k,
                self.offsets[k]
            )));
        }

        match (&self.mode, self.stride) {
            (None, None) => Ok(()),
            (Some(mode), Some(stride)) if mode == INTERLEAVED_MODE => {
                if stride == 0 {
                    return Err(TarzoomError::InvalidIndex("stride is 0".into()));
                }
                if self.range_count() % stride as usize != 0 {
                    return Err(TarzoomError::InvalidIndex(format!(
                        "{} ranges do not divide into groups of {}",
                        self.range_count(),
                        stride
                    )));
                }
                Ok(())
            }
            (Some(mode), _) if mode != INTERLEAVED_MODE => Err(TarzoomError::InvalidIndex(
                format!("unknown mode '{}'", mode),
            )),
            _ => Err(TarzoomError::InvalidIndex(
                "mode and stride must be present together".into(),
            )),
        }
    }
}

//! Pyramid packer: one tile pyramid in, one `.tzb` / `.tzi` pair out.
//!
//! Tiles are concatenated in pack order: levels ascending, then row-major
//! within each level (column index varies fastest). Every grid cell takes
//! exactly one offset slot, so tile `k` of the archive is always
//! `offsets[k]..offsets[k + 1]`.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::error::{TarzoomError, TarzoomResult};
use crate::index::PyramidIndex;
use crate::log::Logger;
use crate::output::{ArchivePaths, ArchiveWriter};
use crate::pyramid::{MissingTilePolicy, PyramidSource, ScannedPyramid, TileFile};
use crate::{log_debug, log_info, log_warn};

/// Options for a packing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackOptions {
    pub missing_tiles: MissingTilePolicy,
    /// Remove the descriptor and level directory after a successful pack.
    pub delete_sources: bool,
}

/// Outcome of a packing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub archive: ArchivePaths,
    pub levels: usize,
    /// Grid cells packed, holes included.
    pub tiles: usize,
    /// Cells recorded as zero-length holes.
    pub holes: usize,
    pub bytes: u64,
    pub sources_deleted: bool,
}

/// Running byte offset and the offsets recorded so far.
///
/// Starts as `[0]`; each appended cell pushes the offset just past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OffsetAccumulator {
    offset: u64,
    offsets: Vec<u64>,
}

impl OffsetAccumulator {
    pub(crate) fn with_capacity(ranges: usize) -> Self {
        let mut offsets = Vec::with_capacity(ranges + 1);
        offsets.push(0);
        Self { offset: 0, offsets }
    }

    /// Close a range of `len` bytes.
    pub(crate) fn push(&mut self, len: u64) {
        self.offset += len;
        self.offsets.push(self.offset);
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn into_offsets(self) -> Vec<u64> {
        self.offsets
    }
}

/// Packs tile pyramids into tarzoom archives.
pub struct PyramidPacker {
    options: PackOptions,
    logger: Arc<dyn Logger>,
}

impl PyramidPacker {
    pub fn new(options: PackOptions, logger: Arc<dyn Logger>) -> Self {
        Self { options, logger }
    }

    /// Pack `<basename>.dzi` + `<basename>_files/` into
    /// `<basename>.tzb` + `<basename>.tzi`.
    pub fn pack_basename(&self, basename: &Path) -> TarzoomResult<PackSummary> {
        self.pack(
            &PyramidSource::from_basename(basename),
            ArchivePaths::from_basename(basename),
        )
    }

    /// Pack `source` into the archive at `output`.
    ///
    /// Nothing is written at `output` unless every tile was copied.
    pub fn pack(&self, source: &PyramidSource, output: ArchivePaths) -> TarzoomResult<PackSummary> {
        log_info!(self.logger, "Packing {}", source.levels_dir.display());

        let pyramid = source.scan(self.options.missing_tiles)?;
        let holes: usize = pyramid.levels.iter().map(|l| l.hole_count()).sum();
        if holes > 0 {
            log_warn!(
                self.logger,
                "{} missing tiles in {} will be packed as empty ranges",
                holes,
                source.levels_dir.display()
            );
        }

        let (index, archive) = self.write_archive(&pyramid, output)?;

        log_info!(
            self.logger,
            "Packed {} tiles in {} levels ({} bytes) into {}",
            index.range_count(),
            index.levels,
            index.blob_len(),
            archive.blob.display()
        );

        let sources_deleted = self.options.delete_sources && remove_sources(source, &archive)?;
        if sources_deleted {
            log_debug!(self.logger, "Removed {}", source.levels_dir.display());
        } else if self.options.delete_sources {
            log_warn!(
                self.logger,
                "Kept {}: the archive was written inside it",
                source.levels_dir.display()
            );
        }

        Ok(PackSummary {
            archive,
            levels: pyramid.levels.len(),
            tiles: index.range_count(),
            holes,
            bytes: index.blob_len(),
            sources_deleted,
        })
    }

    fn write_archive(
        &self,
        pyramid: &ScannedPyramid,
        output: ArchivePaths,
    ) -> TarzoomResult<(PyramidIndex, ArchivePaths)> {
        let mut writer = ArchiveWriter::create(output)?;
        let mut acc = OffsetAccumulator::with_capacity(pyramid.cell_count());
        let level_count = pyramid.levels.len();

        for (i, level) in pyramid.levels.iter().enumerate() {
            log_debug!(
                self.logger,
                "Level {} ({}/{}): {}x{} tiles",
                level.level,
                i + 1,
                level_count,
                level.columns,
                level.rows
            );
            for cell in level.cells() {
                let len = match cell {
                    Some(tile) => append_tile(&mut writer, tile)?,
                    None => 0,
                };
                acc.push(len);
            }
        }
        debug_assert_eq!(acc.offset(), writer.written());

        let index = PyramidIndex {
            tile_size: pyramid.descriptor.tile_size,
            overlap: pyramid.descriptor.overlap,
            format: pyramid.format.clone(),
            width: pyramid.descriptor.width,
            height: pyramid.descriptor.height,
            levels: level_count as u32,
            offsets: acc.into_offsets(),
            mode: None,
            stride: None,
        };
        let archive = writer.commit(&index)?;
        Ok((index, archive))
    }
}

/// Copy one tile file into the blob and return the bytes copied.
///
/// The size recorded during the scan is authoritative: a file that changed
/// length since then is reported as an I/O error instead of silently
/// shifting every later offset.
fn append_tile(writer: &mut ArchiveWriter, tile: &TileFile) -> TarzoomResult<u64> {
    let file = File::open(&tile.path).map_err(|e| TarzoomError::read(&tile.path, e))?;

    let mut bytes = Vec::with_capacity(tile.size as usize);
    file.take(tile.size + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| TarzoomError::read(&tile.path, e))?;

    if bytes.len() as u64 != tile.size {
        return Err(TarzoomError::read(
            &tile.path,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "tile changed size during packing ({} bytes scanned, {} read)",
                    tile.size,
                    bytes.len()
                ),
            ),
        ));
    }

    writer.append(&bytes)?;
    Ok(tile.size)
}

/// Delete the descriptor and the level directory of a packed pyramid.
///
/// Returns `false` without deleting anything when the archive was written
/// inside the level directory.
fn remove_sources(source: &PyramidSource, archive: &ArchivePaths) -> TarzoomResult<bool> {
    if archive.blob.starts_with(&source.levels_dir) || archive.index.starts_with(&source.levels_dir)
    {
        return Ok(false);
    }

    fs::remove_file(&source.descriptor).map_err(|e| TarzoomError::write(&source.descriptor, e))?;
    fs::remove_dir_all(&source.levels_dir)
        .map_err(|e| TarzoomError::write(&source.levels_dir, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{MemoryLogger, NoOpLogger};

    const DZI: &str = r#"<Image TileSize="256" Overlap="1" Format="jpg"><Size Width="300" Height="300"/></Image>"#;

    fn write_level(root: &Path, level: u32, tiles: &[(u32, u32, usize)]) {
        let dir = root.join("plane_0_files").join(level.to_string());
        fs::create_dir_all(&dir).unwrap();
        for &(col, row, size) in tiles {
            let byte = (level * 16 + row * 4 + col) as u8;
            fs::write(dir.join(format!("{}_{}.jpg", col, row)), vec![byte; size]).unwrap();
        }
    }

    fn packer(options: PackOptions) -> PyramidPacker {
        PyramidPacker::new(options, Arc::new(NoOpLogger))
    }

    #[test]
    fn test_accumulator() {
        let mut acc = OffsetAccumulator::with_capacity(3);
        acc.push(100);
        acc.push(0);
        acc.push(20);
        assert_eq!(acc.offset(), 120);
        assert_eq!(acc.into_offsets(), vec![0, 100, 100, 120]);
    }

    #[test]
    fn test_pack_two_by_two_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(
            dir.path(),
            0,
            &[(0, 0, 100), (1, 0, 150), (0, 1, 120), (1, 1, 130)],
        );

        let summary = packer(PackOptions::default())
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap();

        let index = PyramidIndex::load(&summary.archive.index).unwrap();
        assert_eq!(index.offsets, vec![0, 100, 250, 370, 500]);
        assert_eq!(index.width, 300);
        assert_eq!(index.height, 300);
        assert_eq!(index.overlap, 1);
        assert_eq!(index.levels, 1);
        assert_eq!(index.format, "jpg");
        assert_eq!(summary.tiles, 4);
        assert_eq!(summary.bytes, 500);

        let blob = fs::read(&summary.archive.blob).unwrap();
        assert_eq!(blob.len(), 500);
        assert!(blob[100..250].iter().all(|&b| b == 1));
        assert!(blob[250..370].iter().all(|&b| b == 4));
    }

    #[test]
    fn test_pack_order_is_numeric_levels_then_row_major() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        for level in 0..=10 {
            write_level(dir.path(), level, &[(0, 0, 1)]);
        }
        write_level(dir.path(), 11, &[(0, 0, 1), (1, 0, 1)]);

        let summary = packer(PackOptions::default())
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap();

        let blob = fs::read(&summary.archive.blob).unwrap();
        let expected: Vec<u8> = (0..=10u8)
            .map(|l| l * 16)
            .chain([11 * 16, 11 * 16 + 1])
            .collect();
        assert_eq!(blob, expected);
        assert_eq!(summary.levels, 12);
        assert_eq!(summary.tiles, 13);
    }

    #[test]
    fn test_missing_tile_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(dir.path(), 0, &[(0, 0, 10), (1, 0, 10), (1, 1, 10)]);

        let err = packer(PackOptions::default())
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap_err();

        assert!(err.is_structural());
        assert!(!dir.path().join("plane_0.tzb").exists());
        assert!(!dir.path().join("plane_0.tzi").exists());
        assert!(dir.path().join("plane_0_files").exists());
    }

    #[test]
    fn test_tile_at_u32_max_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(dir.path(), 0, &[(0, 0, 4)]);
        let level_dir = dir.path().join("plane_0_files/0");
        fs::write(level_dir.join(format!("{}_0.jpg", u32::MAX)), b"x").unwrap();

        let err = packer(PackOptions::default())
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap_err();

        assert!(matches!(err, TarzoomError::TileOutsideGrid { col: u32::MAX, .. }));
        assert!(!dir.path().join("plane_0.tzb").exists());
        assert!(!dir.path().join("plane_0.tzi").exists());
    }

    #[test]
    fn test_missing_tile_with_empty_policy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(dir.path(), 0, &[(0, 0, 10), (1, 0, 10), (1, 1, 10)]);

        let logger = Arc::new(MemoryLogger::new());
        let options = PackOptions {
            missing_tiles: MissingTilePolicy::Empty,
            ..PackOptions::default()
        };
        let summary = PyramidPacker::new(options, logger.clone())
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap();

        let index = PyramidIndex::load(&summary.archive.index).unwrap();
        assert_eq!(index.offsets, vec![0, 10, 20, 20, 30]);
        assert_eq!(summary.holes, 1);
        assert!(logger.contains("1 missing tiles"));
    }

    #[test]
    fn test_delete_sources_after_success() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(dir.path(), 0, &[(0, 0, 3)]);

        let options = PackOptions {
            delete_sources: true,
            ..PackOptions::default()
        };
        let summary = packer(options)
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap();

        assert!(summary.sources_deleted);
        assert!(!dir.path().join("plane_0.dzi").exists());
        assert!(!dir.path().join("plane_0_files").exists());
        assert!(summary.archive.blob.exists());
    }

    #[test]
    fn test_pack_to_separate_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(dir.path(), 0, &[(0, 0, 3), (1, 0, 4)]);

        let source = PyramidSource::from_basename(&dir.path().join("plane_0"));
        let output = ArchivePaths::from_basename(&dir.path().join("out/archive"));
        let summary = packer(PackOptions::default()).pack(&source, output).unwrap();

        assert_eq!(summary.archive.blob, dir.path().join("out/archive.tzb"));
        assert_eq!(fs::read(&summary.archive.blob).unwrap().len(), 7);
    }

    #[test]
    fn test_progress_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plane_0.dzi"), DZI).unwrap();
        write_level(dir.path(), 0, &[(0, 0, 1)]);
        write_level(dir.path(), 1, &[(0, 0, 1), (0, 1, 1)]);

        let logger = Arc::new(MemoryLogger::new());
        PyramidPacker::new(PackOptions::default(), logger.clone())
            .pack_basename(&dir.path().join("plane_0"))
            .unwrap();

        assert!(logger.contains("Level 1 (2/2): 1x2 tiles"));
        assert!(logger.contains("Packed 3 tiles in 2 levels"));
    }
}

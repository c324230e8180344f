//! Reading packed archives.
//!
//! [`Archive`] opens a `.tzb`/`.tzi` pair, checks that the blob is exactly as
//! long as the index says, and serves tile bytes by position. Interleaved
//! archives can also be split back into one single-plane archive per plane.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

use crate::error::{TarzoomError, TarzoomResult};
use crate::index::PyramidIndex;
use crate::output::{ArchivePaths, ArchiveWriter};
use crate::pack::OffsetAccumulator;

/// An opened archive.
pub struct Archive {
    paths: ArchivePaths,
    index: PyramidIndex,
    blob: File,
}

/// Size statistics over an archive's ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    pub ranges: usize,
    pub tiles: usize,
    pub stride: usize,
    pub bytes: u64,
    pub smallest: u64,
    pub largest: u64,
    /// Zero-length ranges (absent cells packed with the `empty` policy).
    pub empty: usize,
}

impl Archive {
    /// Open the archive named by `path` (base name, `.tzi` or `.tzb`).
    ///
    /// # Errors
    ///
    /// - [`TarzoomError::IndexParse`] / [`TarzoomError::InvalidIndex`] for a
    ///   bad index
    /// - [`TarzoomError::BlobLengthMismatch`] when the blob is shorter or
    ///   longer than the final offset
    pub fn open(path: &Path) -> TarzoomResult<Self> {
        let paths = ArchivePaths::from_member(path);
        let index = PyramidIndex::load(&paths.index)?;
        let blob = File::open(&paths.blob).map_err(|e| TarzoomError::read(&paths.blob, e))?;
        let actual = blob
            .metadata()
            .map_err(|e| TarzoomError::read(&paths.blob, e))?
            .len();
        if actual != index.blob_len() {
            return Err(TarzoomError::BlobLengthMismatch {
                path: paths.blob.clone(),
                expected: index.blob_len(),
                actual,
            });
        }
        Ok(Self { paths, index, blob })
    }

    pub fn paths(&self) -> &ArchivePaths {
        &self.paths
    }

    pub fn index(&self) -> &PyramidIndex {
        &self.index
    }

    pub fn stats(&self) -> ArchiveStats {
        let sizes = self.index.sizes();
        ArchiveStats {
            ranges: self.index.range_count(),
            tiles: self.index.tile_count(),
            stride: self.index.stride(),
            bytes: self.index.blob_len(),
            smallest: sizes.iter().copied().min().unwrap_or(0),
            largest: sizes.iter().copied().max().unwrap_or(0),
            empty: sizes.iter().filter(|&&s| s == 0).count(),
        }
    }

    /// Bytes of tile `k` in a single-plane archive.
    pub fn tile(&mut self, k: usize) -> TarzoomResult<Vec<u8>> {
        if self.index.is_interleaved() {
            return Err(TarzoomError::ModeMismatch(format!(
                "{} is interleaved; read groups or plane tiles instead",
                self.paths.index.display()
            )));
        }
        let range = self.index.range(k)?;
        self.read_range(range)
    }

    /// Bytes of every plane's copy of tile position `p`, concatenated in
    /// plane order.
    pub fn group(&mut self, p: usize) -> TarzoomResult<Vec<u8>> {
        self.require_interleaved()?;
        let range = self.index.group_range(p)?;
        self.read_range(range)
    }

    /// Bytes of plane `j`'s copy of tile position `p`.
    pub fn plane_tile(&mut self, p: usize, j: usize) -> TarzoomResult<Vec<u8>> {
        self.require_interleaved()?;
        let range = self.index.plane_range(p, j)?;
        self.read_range(range)
    }

    /// Split an interleaved archive into `<prefix>_<j>.tzb/.tzi` under
    /// `output_dir`, one pair per plane.
    ///
    /// Each output has the metadata of this archive without `mode`/`stride`.
    /// When the source planes shared that metadata, the outputs are
    /// byte-identical to the archives that were interleaved.
    ///
    /// At most `max_open_planes` outputs are open at once; with more planes
    /// the blob is read once per group of that many planes. If a later group
    /// fails, the planes of earlier groups stay published.
    pub fn deinterleave(
        &mut self,
        output_dir: &Path,
        prefix: &str,
        max_open_planes: usize,
    ) -> TarzoomResult<Vec<ArchivePaths>> {
        self.require_interleaved()?;
        let n = self.index.stride();
        let group = max_open_planes.max(1);

        let mut published = Vec::with_capacity(n);
        for first in (0..n).step_by(group) {
            let planes = first..(first + group).min(n);
            published.extend(self.write_planes(planes, output_dir, prefix)?);
        }
        Ok(published)
    }

    /// One pass over the blob, copying the ranges of `planes` into new
    /// single-plane archives.
    fn write_planes(
        &mut self,
        planes: Range<usize>,
        output_dir: &Path,
        prefix: &str,
    ) -> TarzoomResult<Vec<ArchivePaths>> {
        let n = self.index.stride();
        let tiles = self.index.tile_count();

        let mut writers = planes
            .clone()
            .map(|j| {
                let basename = output_dir.join(format!("{}_{}", prefix, j));
                ArchiveWriter::create(ArchivePaths::from_basename(&basename))
            })
            .collect::<TarzoomResult<Vec<_>>>()?;
        let mut accumulators: Vec<OffsetAccumulator> = planes
            .clone()
            .map(|_| OffsetAccumulator::with_capacity(tiles))
            .collect();

        self.blob
            .seek(SeekFrom::Start(0))
            .map_err(|e| TarzoomError::read(&self.paths.blob, e))?;
        let mut reader = BufReader::new(&self.blob);
        let mut buf = Vec::new();

        for (k, size) in self.index.sizes().into_iter().enumerate() {
            let j = k % n;
            if !planes.contains(&j) {
                let skip = i64::try_from(size).map_err(|_| {
                    TarzoomError::InvalidIndex(format!("range {} is {} bytes", k, size))
                })?;
                reader
                    .seek_relative(skip)
                    .map_err(|e| TarzoomError::read(&self.paths.blob, e))?;
                continue;
            }
            buf.resize(size as usize, 0);
            reader
                .read_exact(&mut buf)
                .map_err(|e| TarzoomError::read(&self.paths.blob, e))?;
            writers[j - planes.start].append(&buf)?;
            accumulators[j - planes.start].push(size);
        }

        writers
            .into_iter()
            .zip(accumulators)
            .map(|(writer, acc)| {
                let index = PyramidIndex {
                    offsets: acc.into_offsets(),
                    mode: None,
                    stride: None,
                    ..self.index.clone()
                };
                writer.commit(&index)
            })
            .collect()
    }

    fn require_interleaved(&self) -> TarzoomResult<()> {
        if self.index.is_interleaved() {
            Ok(())
        } else {
            Err(TarzoomError::ModeMismatch(format!(
                "{} is a single-plane archive",
                self.paths.index.display()
            )))
        }
    }

    fn read_range(&mut self, range: Range<u64>) -> TarzoomResult<Vec<u8>> {
        let mut buf = vec![0; (range.end - range.start) as usize];
        self.blob
            .seek(SeekFrom::Start(range.start))
            .and_then(|_| self.blob.read_exact(&mut buf))
            .map_err(|e| TarzoomError::read(&self.paths.blob, e))?;
        Ok(buf)
    }
}

/// Check an archive without keeping it open.
///
/// Returns the index on success; see [`Archive::open`] for the checks.
pub fn verify(path: &Path) -> TarzoomResult<PyramidIndex> {
    let archive = Archive::open(path)?;
    Ok(archive.index)
}

//! Plane interleaver: N single-plane archives in, one interleaved archive out.
//!
//! For every tile position `p`, the copies of that tile from plane 0, 1, …,
//! N-1 are written back to back, so a client fetches all planes of a tile
//! with the single range `offsets[p*N]..offsets[(p+1)*N]`. Plane order is
//! the order the planes were supplied in.
//!
//! Planes are read front to back in lock-step. With at most
//! `max_open_planes` planes every blob stays open for the whole run; beyond
//! that each read reopens the blob and seeks, trading speed for file
//! descriptors.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{TarzoomError, TarzoomResult};
use crate::index::{PyramidIndex, INTERLEAVED_MODE};
use crate::log::Logger;
use crate::output::{ArchivePaths, ArchiveWriter};
use crate::pack::OffsetAccumulator;
use crate::{log_debug, log_info};

/// Default limit on concurrently open plane blobs.
pub const DEFAULT_MAX_OPEN_PLANES: usize = 256;

/// Options for an interleaving run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleaveOptions {
    /// Compare tile size, overlap, format, dimensions and level count across
    /// planes before copying.
    pub validate_geometry: bool,
    /// Above this many planes, blobs are reopened per read.
    pub max_open_planes: usize,
    /// Remove the input archives after a successful run.
    pub delete_sources: bool,
}

impl Default for InterleaveOptions {
    fn default() -> Self {
        Self {
            validate_geometry: true,
            max_open_planes: DEFAULT_MAX_OPEN_PLANES,
            delete_sources: false,
        }
    }
}

/// Outcome of an interleaving run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleaveSummary {
    pub archive: ArchivePaths,
    pub planes: usize,
    /// Tile positions per plane.
    pub tiles: usize,
    pub bytes: u64,
    /// Whether blobs were reopened per read.
    pub reopened: bool,
    pub sources_deleted: bool,
}

/// One single-plane archive opened for interleaving.
#[derive(Debug, Clone)]
pub struct PlaneArchive {
    pub paths: ArchivePaths,
    pub index: PyramidIndex,
}

impl PlaneArchive {
    /// Load a plane given its `.tzi`, `.tzb` or base name.
    pub fn open(path: &Path) -> TarzoomResult<Self> {
        let paths = ArchivePaths::from_member(path);
        let index = PyramidIndex::load(&paths.index)?;
        if !paths.blob.exists() {
            return Err(TarzoomError::MissingPlaneBlob {
                index: paths.index.clone(),
                blob: paths.blob.clone(),
            });
        }
        Ok(Self { paths, index })
    }
}

/// Source of one plane's tile bytes.
enum PlaneReader {
    /// Blob held open and read sequentially.
    Streaming {
        path: PathBuf,
        reader: BufReader<File>,
    },
    /// Blob opened and positioned for every read.
    Reopening { path: PathBuf },
}

impl PlaneReader {
    fn open(path: &Path, keep_open: bool) -> TarzoomResult<Self> {
        if keep_open {
            let file = File::open(path).map_err(|e| TarzoomError::read(path, e))?;
            Ok(PlaneReader::Streaming {
                path: path.to_path_buf(),
                reader: BufReader::new(file),
            })
        } else {
            Ok(PlaneReader::Reopening {
                path: path.to_path_buf(),
            })
        }
    }

    /// Fill `buf` with the bytes of `range`.
    ///
    /// Streaming readers rely on ranges arriving in ascending, contiguous
    /// order, which holds because every plane is consumed in pack order.
    fn read_range(&mut self, range: Range<u64>, buf: &mut [u8]) -> io::Result<()> {
        match self {
            PlaneReader::Streaming { reader, .. } => reader.read_exact(buf),
            PlaneReader::Reopening { path } => {
                let mut file = File::open(path)?;
                file.seek(SeekFrom::Start(range.start))?;
                file.read_exact(buf)
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            PlaneReader::Streaming { path, .. } | PlaneReader::Reopening { path } => path,
        }
    }
}

/// Merges single-plane archives into one interleaved archive.
pub struct PlaneInterleaver {
    options: InterleaveOptions,
    logger: Arc<dyn Logger>,
}

impl PlaneInterleaver {
    pub fn new(options: InterleaveOptions, logger: Arc<dyn Logger>) -> Self {
        Self { options, logger }
    }

    /// Open every plane in `inputs` (each a `.tzi`, `.tzb` or base name) and
    /// interleave them into `output`.
    pub fn interleave_paths(
        &self,
        inputs: &[PathBuf],
        output: ArchivePaths,
    ) -> TarzoomResult<InterleaveSummary> {
        let planes = inputs
            .iter()
            .map(|p| PlaneArchive::open(p))
            .collect::<TarzoomResult<Vec<_>>>()?;
        self.interleave(&planes, output)
    }

    /// Interleave `planes`, in the given order, into `output`.
    ///
    /// # Errors
    ///
    /// - [`TarzoomError::NoPlanes`] if `planes` is empty
    /// - [`TarzoomError::ModeMismatch`] if an input is already interleaved
    /// - [`TarzoomError::PlaneLengthMismatch`] if tile counts differ or a
    ///   blob is shorter than its index claims
    /// - [`TarzoomError::GeometryMismatch`] if validation is enabled and
    ///   the planes describe different pyramids
    pub fn interleave(
        &self,
        planes: &[PlaneArchive],
        output: ArchivePaths,
    ) -> TarzoomResult<InterleaveSummary> {
        let first = planes
            .first()
            .ok_or_else(|| TarzoomError::NoPlanes(output.index.display().to_string()))?;
        self.check_planes(planes)?;

        let n = planes.len();
        let tiles = first.index.range_count();
        let keep_open = n <= self.options.max_open_planes;
        log_info!(
            self.logger,
            "Interleaving {} planes of {} tiles into {}",
            n,
            tiles,
            output.blob.display()
        );
        if !keep_open {
            log_info!(
                self.logger,
                "{} planes exceed the open file limit of {}; reopening blobs per tile",
                n,
                self.options.max_open_planes
            );
        }

        let mut readers = planes
            .iter()
            .map(|plane| PlaneReader::open(&plane.paths.blob, keep_open))
            .collect::<TarzoomResult<Vec<_>>>()?;

        let mut writer = ArchiveWriter::create(output)?;
        let mut acc = OffsetAccumulator::with_capacity(n * tiles);
        let mut buf = Vec::new();
        let report_every = (tiles / 10).max(1);

        for p in 0..tiles {
            for (j, (plane, reader)) in planes.iter().zip(readers.iter_mut()).enumerate() {
                let range = plane.index.offsets[p]..plane.index.offsets[p + 1];
                buf.resize((range.end - range.start) as usize, 0);
                reader.read_range(range, &mut buf).map_err(|e| {
                    if e.kind() == io::ErrorKind::UnexpectedEof {
                        TarzoomError::PlaneLengthMismatch {
                            plane: j,
                            reason: format!(
                                "{} ended before tile position {}",
                                reader.path().display(),
                                p
                            ),
                        }
                    } else {
                        TarzoomError::read(reader.path(), e)
                    }
                })?;
                writer.append(&buf)?;
                acc.push(buf.len() as u64);
            }
            if (p + 1) % report_every == 0 {
                log_debug!(self.logger, "Interleaved {}/{} tile positions", p + 1, tiles);
            }
        }
        drop(readers);

        let index = PyramidIndex {
            offsets: acc.into_offsets(),
            mode: Some(INTERLEAVED_MODE.to_string()),
            stride: Some(n as u32),
            ..first.index.clone()
        };
        let archive = writer.commit(&index)?;
        log_info!(
            self.logger,
            "Wrote {} ({} bytes, stride {})",
            archive.blob.display(),
            index.blob_len(),
            n
        );

        let sources_deleted = if self.options.delete_sources {
            remove_planes(planes, &archive)?;
            log_debug!(self.logger, "Removed {} input planes", n);
            true
        } else {
            false
        };

        Ok(InterleaveSummary {
            archive,
            planes: n,
            tiles,
            bytes: index.blob_len(),
            reopened: !keep_open,
            sources_deleted,
        })
    }

    fn check_planes(&self, planes: &[PlaneArchive]) -> TarzoomResult<()> {
        let reference = &planes[0].index;

        for (j, plane) in planes.iter().enumerate() {
            let index = &plane.index;
            if index.mode.is_some() {
                return Err(TarzoomError::ModeMismatch(format!(
                    "plane {} ({}) is already interleaved",
                    j,
                    plane.paths.index.display()
                )));
            }

            if index.range_count() != reference.range_count() {
                return Err(TarzoomError::PlaneLengthMismatch {
                    plane: j,
                    reason: format!(
                        "{} tiles, plane 0 has {}",
                        index.range_count(),
                        reference.range_count()
                    ),
                });
            }

            if self.options.validate_geometry {
                check_geometry(j, reference, index)?;
            }

            let actual = fs::metadata(&plane.paths.blob)
                .map_err(|e| TarzoomError::read(&plane.paths.blob, e))?
                .len();
            if actual < index.blob_len() {
                return Err(TarzoomError::PlaneLengthMismatch {
                    plane: j,
                    reason: format!(
                        "{} is {} bytes, index expects {}",
                        plane.paths.blob.display(),
                        actual,
                        index.blob_len()
                    ),
                });
            }
        }
        Ok(())
    }
}

fn check_geometry(plane: usize, expected: &PyramidIndex, found: &PyramidIndex) -> TarzoomResult<()> {
    let fields: [(&'static str, String, String); 6] = [
        (
            "tilesize",
            expected.tile_size.to_string(),
            found.tile_size.to_string(),
        ),
        (
            "overlap",
            expected.overlap.to_string(),
            found.overlap.to_string(),
        ),
        ("format", expected.format.clone(), found.format.clone()),
        ("width", expected.width.to_string(), found.width.to_string()),
        (
            "height",
            expected.height.to_string(),
            found.height.to_string(),
        ),
        (
            "nlevels",
            expected.levels.to_string(),
            found.levels.to_string(),
        ),
    ];

    match fields.into_iter().find(|(_, e, f)| e != f) {
        Some((field, expected, found)) => Err(TarzoomError::GeometryMismatch {
            plane,
            field,
            expected,
            found,
        }),
        None => Ok(()),
    }
}

/// Delete every input archive that is not the output itself.
fn remove_planes(planes: &[PlaneArchive], archive: &ArchivePaths) -> TarzoomResult<()> {
    for plane in planes {
        for path in [&plane.paths.blob, &plane.paths.index] {
            if path == &archive.blob || path == &archive.index {
                continue;
            }
            fs::remove_file(path).map_err(|e| TarzoomError::write(path, e))?;
        }
    }
    Ok(())
}

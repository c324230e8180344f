//! Folder mode: pack or interleave every `plane_<n>` found in a directory.
//!
//! Relighting pipelines emit one pyramid per light plane, named
//! `plane_0.dzi`, `plane_1.dzi`, … next to their `_files` directories.
//! [`pack_folder`] turns each into `plane_<n>.tzb/.tzi` and
//! [`interleave_folder`] merges those into a single `planes.tzb/.tzi`.
//! Planes are always processed in numeric order, so `plane_10` follows
//! `plane_9`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;
use regex::Regex;

use crate::error::{TarzoomError, TarzoomResult};
use crate::interleave::{InterleaveOptions, InterleaveSummary, PlaneArchive, PlaneInterleaver};
use crate::log::Logger;
use crate::output::{ArchivePaths, BLOB_EXTENSION, INDEX_EXTENSION};
use crate::pack::{PackOptions, PackSummary, PyramidPacker};
use crate::pyramid::{PyramidSource, DESCRIPTOR_EXTENSION};
use crate::{log_info, log_warn};

/// Base name of the interleaved archive written by [`interleave_folder`].
pub const INTERLEAVED_BASENAME: &str = "planes";

/// Prefix shared by per-plane files.
pub const PLANE_PREFIX: &str = "plane";

fn plane_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^plane_(\d+)\.([A-Za-z0-9]+)$").expect("valid plane pattern")
    })
}

/// Options for [`pack_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderPackOptions {
    pub pack: PackOptions,
    /// Pack planes concurrently.
    pub parallel: bool,
}

/// A `plane_<n>` file found in a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneFile {
    pub number: u32,
    pub path: PathBuf,
}

impl PlaneFile {
    /// The path without its extension, e.g. `dir/plane_3`.
    pub fn basename(&self) -> PathBuf {
        self.path.with_extension("")
    }
}

/// Files named `plane_<n>.<extension>` directly inside `dir`, sorted by `n`.
pub fn discover_planes(dir: &Path, extension: &str) -> TarzoomResult<Vec<PlaneFile>> {
    let entries = fs::read_dir(dir).map_err(|e| TarzoomError::read(dir, e))?;

    let mut planes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TarzoomError::read(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(captures) = plane_pattern().captures(name) else {
            continue;
        };
        if &captures[2] != extension {
            continue;
        }
        // Digits that overflow u32 are not a plane we could have written.
        let Ok(number) = captures[1].parse::<u32>() else {
            continue;
        };
        if entry.path().is_file() {
            planes.push(PlaneFile {
                number,
                path: entry.path(),
            });
        }
    }

    planes.sort_by_key(|p| p.number);
    Ok(planes)
}

/// Pack every `plane_<n>` pyramid in `input` into `output/plane_<n>.tzb/.tzi`.
///
/// Summaries are returned in plane order. The first failing plane aborts
/// the batch; planes already packed stay on disk.
///
/// # Errors
///
/// [`TarzoomError::NoPlanes`] if `input` contains no `plane_<n>.dzi`.
pub fn pack_folder(
    input: &Path,
    output: &Path,
    options: FolderPackOptions,
    logger: Arc<dyn Logger>,
) -> TarzoomResult<Vec<PackSummary>> {
    let planes = discover_planes(input, DESCRIPTOR_EXTENSION)?;
    if planes.is_empty() {
        return Err(TarzoomError::NoPlanes(input.display().to_string()));
    }

    log_info!(
        logger,
        "Packing {} planes from {}{}",
        planes.len(),
        input.display(),
        if options.parallel { " in parallel" } else { "" }
    );

    let packer = PyramidPacker::new(options.pack, Arc::clone(&logger));
    let total = planes.len();
    let pack_one = |(i, plane): (usize, &PlaneFile)| -> TarzoomResult<PackSummary> {
        log_info!(logger, "Plane {}/{}: plane_{}", i + 1, total, plane.number);
        let source = PyramidSource::from_basename(&plane.basename());
        let target = output.join(format!("{}_{}", PLANE_PREFIX, plane.number));
        packer.pack(&source, ArchivePaths::from_basename(&target))
    };

    if options.parallel {
        planes.par_iter().enumerate().map(pack_one).collect()
    } else {
        planes.iter().enumerate().map(pack_one).collect()
    }
}

/// Interleave every `plane_<n>.tzi` in `input` into `output/planes.tzb/.tzi`.
///
/// # Errors
///
/// - [`TarzoomError::NoPlanes`] if `input` contains no `plane_<n>.tzi`
/// - [`TarzoomError::MissingPlaneBlob`] if an index has no `.tzb` beside it
/// - anything [`PlaneInterleaver::interleave`] reports
pub fn interleave_folder(
    input: &Path,
    output: &Path,
    options: InterleaveOptions,
    logger: Arc<dyn Logger>,
) -> TarzoomResult<InterleaveSummary> {
    let indexes = discover_planes(input, INDEX_EXTENSION)?;
    if indexes.is_empty() {
        return Err(TarzoomError::NoPlanes(input.display().to_string()));
    }

    let blobs = discover_planes(input, BLOB_EXTENSION)?;
    for blob in blobs
        .iter()
        .filter(|b| !indexes.iter().any(|i| i.number == b.number))
    {
        log_warn!(logger, "Ignoring {}: no matching index", blob.path.display());
    }

    let planes = indexes
        .iter()
        .map(|plane| PlaneArchive::open(&plane.path))
        .collect::<TarzoomResult<Vec<_>>>()?;

    PlaneInterleaver::new(options, logger).interleave(
        &planes,
        ArchivePaths::from_basename(&output.join(INTERLEAVED_BASENAME)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PyramidIndex;
    use crate::log::NoOpLogger;

    fn write_pyramid(dir: &Path, plane: u32, sizes: &[usize]) {
        let basename = dir.join(format!("plane_{}", plane));
        fs::write(
            basename.with_extension("dzi"),
            r#"<Image TileSize="256" Overlap="0" Format="jpg"><Size Width="1024" Height="256"/></Image>"#,
        )
        .unwrap();
        let level = dir.join(format!("plane_{}_files", plane)).join("9");
        fs::create_dir_all(&level).unwrap();
        for (col, size) in sizes.iter().enumerate() {
            fs::write(level.join(format!("{}_0.jpg", col)), vec![plane as u8; *size]).unwrap();
        }
    }

    #[test]
    fn test_discover_planes_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["plane_10.tzi", "plane_2.tzi", "plane_0.tzi", "plane_1.tzb", "notes.tzi"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("plane_3.tzi")).unwrap();

        let numbers: Vec<u32> = discover_planes(dir.path(), "tzi")
            .unwrap()
            .iter()
            .map(|p| p.number)
            .collect();
        assert_eq!(numbers, vec![0, 2, 10]);
    }

    #[test]
    fn test_plane_basename() {
        let plane = PlaneFile {
            number: 4,
            path: PathBuf::from("run/plane_4.dzi"),
        };
        assert_eq!(plane.basename(), PathBuf::from("run/plane_4"));
    }

    #[test]
    fn test_pack_folder_sequential_and_parallel() {
        for parallel in [false, true] {
            let input = tempfile::tempdir().unwrap();
            let output = tempfile::tempdir().unwrap();
            write_pyramid(input.path(), 0, &[10, 20]);
            write_pyramid(input.path(), 1, &[5, 7]);
            write_pyramid(input.path(), 11, &[1, 1]);

            let summaries = pack_folder(
                input.path(),
                output.path(),
                FolderPackOptions {
                    parallel,
                    ..FolderPackOptions::default()
                },
                Arc::new(NoOpLogger),
            )
            .unwrap();

            assert_eq!(summaries.len(), 3);
            assert_eq!(summaries[2].archive.index, output.path().join("plane_11.tzi"));
            let index = PyramidIndex::load(&output.path().join("plane_1.tzi")).unwrap();
            assert_eq!(index.offsets, vec![0, 5, 12]);
        }
    }

    #[test]
    fn test_pack_folder_without_planes() {
        let dir = tempfile::tempdir().unwrap();
        let err = pack_folder(
            dir.path(),
            dir.path(),
            FolderPackOptions::default(),
            Arc::new(NoOpLogger),
        )
        .unwrap_err();
        assert!(matches!(err, TarzoomError::NoPlanes(_)));
    }

    #[test]
    fn test_interleave_folder() {
        let dir = tempfile::tempdir().unwrap();
        write_pyramid(dir.path(), 0, &[100, 150, 120, 130]);
        write_pyramid(dir.path(), 1, &[90, 95, 80, 85]);
        pack_folder(
            dir.path(),
            dir.path(),
            FolderPackOptions::default(),
            Arc::new(NoOpLogger),
        )
        .unwrap();

        let summary = interleave_folder(
            dir.path(),
            dir.path(),
            InterleaveOptions {
                delete_sources: true,
                ..InterleaveOptions::default()
            },
            Arc::new(NoOpLogger),
        )
        .unwrap();

        let index = PyramidIndex::load(&dir.path().join("planes.tzi")).unwrap();
        assert_eq!(
            index.offsets,
            vec![0, 100, 190, 340, 435, 555, 635, 765, 850]
        );
        assert_eq!(summary.planes, 2);
        assert!(!dir.path().join("plane_0.tzb").exists());
        assert!(!dir.path().join("plane_1.tzi").exists());
    }

    #[test]
    fn test_interleave_folder_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        write_pyramid(dir.path(), 0, &[1]);
        pack_folder(
            dir.path(),
            dir.path(),
            FolderPackOptions::default(),
            Arc::new(NoOpLogger),
        )
        .unwrap();
        fs::remove_file(dir.path().join("plane_0.tzb")).unwrap();

        let err = interleave_folder(
            dir.path(),
            dir.path(),
            InterleaveOptions::default(),
            Arc::new(NoOpLogger),
        )
        .unwrap_err();
        assert!(matches!(err, TarzoomError::MissingPlaneBlob { .. }));
        assert!(!dir.path().join("planes.tzi").exists());
    }
}

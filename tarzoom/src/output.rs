//! Atomic creation of `.tzb` / `.tzi` pairs.
//!
//! Both files are written to temporary files in the destination directory
//! and renamed into place only when the whole run has succeeded. A failed or
//! interrupted run leaves no archive behind, and consumers never observe a
//! half-written one. The blob is renamed before the index, so a visible
//! index always has its blob.

use std::fs;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::error::{TarzoomError, TarzoomResult};
use crate::index::PyramidIndex;

/// Extension of packed tile data.
pub const BLOB_EXTENSION: &str = "tzb";

/// Extension of the JSON index.
pub const INDEX_EXTENSION: &str = "tzi";

/// Paths of an archive pair sharing one base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePaths {
    pub blob: PathBuf,
    pub index: PathBuf,
}

impl ArchivePaths {
    /// `<basename>.tzb` and `<basename>.tzi`.
    ///
    /// The extensions are appended, so a basename containing dots
    /// (`scan.v2/plane_0`) is kept intact.
    pub fn from_basename(basename: &Path) -> Self {
        Self {
            blob: with_suffix(basename, BLOB_EXTENSION),
            index: with_suffix(basename, INDEX_EXTENSION),
        }
    }

    /// Derive the pair from either member's path.
    pub fn from_member(path: &Path) -> Self {
        let is_member = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some(BLOB_EXTENSION) | Some(INDEX_EXTENSION)
        );
        if is_member {
            Self::from_basename(&path.with_extension(""))
        } else {
            Self::from_basename(path)
        }
    }
}

/// Append `.ext` to a path without replacing an existing extension.
pub(crate) fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Create a temporary file in `dir` that, once persisted, carries the same
/// permissions as a file created with [`fs::File::create`].
///
/// `NamedTempFile::new_in` alone creates files with mode 0600.
pub(crate) fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".tarzoom");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the process umask at creation.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Blob writer that tracks how many bytes have been written.
///
/// Created by [`ArchiveWriter::create`]; call [`ArchiveWriter::commit`] with
/// the finished index to publish the pair. Dropping the writer without
/// committing deletes the temporary files.
pub struct ArchiveWriter {
    paths: ArchivePaths,
    blob: BufWriter<NamedTempFile>,
    written: u64,
}

impl ArchiveWriter {
    /// Start a new archive at `paths`.
    ///
    /// The destination directory is created if needed.
    pub fn create(paths: ArchivePaths) -> TarzoomResult<Self> {
        let dir = parent_dir(&paths.blob);
        fs::create_dir_all(&dir).map_err(|e| TarzoomError::write(&dir, e))?;

        let temp = temp_file_in(&dir).map_err(|e| TarzoomError::write(&dir, e))?;

        Ok(Self {
            paths,
            blob: BufWriter::new(temp),
            written: 0,
        })
    }

    /// Final locations of the archive.
    pub fn paths(&self) -> &ArchivePaths {
        &self.paths
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append raw bytes to the blob.
    pub fn append(&mut self, bytes: &[u8]) -> TarzoomResult<()> {
        self.blob
            .write_all(bytes)
            .map_err(|e| TarzoomError::write(&self.paths.blob, e))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Write the index and move both files into place.
    ///
    /// When an archive already exists at the destination, its index is
    /// removed before the new blob is renamed over the old one. A failure
    /// part way through therefore leaves at worst a blob without an index,
    /// never a new blob described by a stale index.
    ///
    /// # Errors
    ///
    /// Returns [`TarzoomError::InvalidIndex`] if the index's final offset does
    /// not match the number of bytes written; nothing is published then.
    pub fn commit(self, index: &PyramidIndex) -> TarzoomResult<ArchivePaths> {
        if index.blob_len() != self.written {
            return Err(TarzoomError::InvalidIndex(format!(
                "index ends at byte {} but {} bytes were written",
                index.blob_len(),
                self.written
            )));
        }

        let ArchivePaths { blob, index: index_path } = self.paths;

        let temp_blob = self
            .blob
            .into_inner()
            .map_err(|e| TarzoomError::write(&blob, e.into_error()))?;
        temp_blob
            .as_file()
            .sync_all()
            .map_err(|e| TarzoomError::write(&blob, e))?;

        let dir = parent_dir(&index_path);
        let mut temp_index = temp_file_in(&dir).map_err(|e| TarzoomError::write(&dir, e))?;
        temp_index
            .write_all(&index.to_json())
            .and_then(|_| temp_index.as_file().sync_all())
            .map_err(|e| TarzoomError::write(&index_path, e))?;

        match fs::remove_file(&index_path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                return Err(TarzoomError::write(&index_path, e));
            }
            _ => {}
        }
        temp_blob
            .persist(&blob)
            .map_err(|e| TarzoomError::write(&blob, e.error))?;
        temp_index
            .persist(&index_path)
            .map_err(|e| TarzoomError::write(&index_path, e.error))?;

        Ok(ArchivePaths {
            blob,
            index: index_path,
        })
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_for(offsets: Vec<u64>) -> PyramidIndex {
        PyramidIndex {
            tile_size: 256,
            overlap: 0,
            format: "jpg".into(),
            width: 1,
            height: 1,
            levels: 1,
            offsets,
            mode: None,
            stride: None,
        }
    }

    #[test]
    fn test_paths_keep_dots_in_basename() {
        let paths = ArchivePaths::from_basename(Path::new("out/scan.v2/plane_0"));
        assert_eq!(paths.blob, PathBuf::from("out/scan.v2/plane_0.tzb"));
        assert_eq!(paths.index, PathBuf::from("out/scan.v2/plane_0.tzi"));
    }

    #[test]
    fn test_paths_from_member() {
        let from_index = ArchivePaths::from_member(Path::new("dir/planes.tzi"));
        let from_blob = ArchivePaths::from_member(Path::new("dir/planes.tzb"));
        let from_base = ArchivePaths::from_member(Path::new("dir/planes"));
        assert_eq!(from_index, from_blob);
        assert_eq!(from_index, from_base);
    }

    #[test]
    fn test_commit_publishes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArchivePaths::from_basename(&dir.path().join("plane_0"));

        let mut writer = ArchiveWriter::create(paths.clone()).unwrap();
        writer.append(b"abc").unwrap();
        writer.append(b"de").unwrap();
        assert_eq!(writer.written(), 5);
        assert!(!paths.blob.exists());

        writer.commit(&index_for(vec![0, 3, 5])).unwrap();

        assert_eq!(fs::read(&paths.blob).unwrap(), b"abcde");
        let index = PyramidIndex::load(&paths.index).unwrap();
        assert_eq!(index.offsets, vec![0, 3, 5]);
    }

    #[test]
    fn test_drop_without_commit_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArchivePaths::from_basename(&dir.path().join("plane_0"));

        {
            let mut writer = ArchiveWriter::create(paths.clone()).unwrap();
            writer.append(b"partial").unwrap();
        }

        assert!(!paths.blob.exists());
        assert!(!paths.index.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_commit_rejects_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArchivePaths::from_basename(&dir.path().join("plane_0"));

        let mut writer = ArchiveWriter::create(paths.clone()).unwrap();
        writer.append(b"abc").unwrap();
        let err = writer.commit(&index_for(vec![0, 4])).unwrap_err();

        assert!(matches!(err, TarzoomError::InvalidIndex(_)));
        assert!(!paths.blob.exists());
        assert!(!paths.index.exists());
    }

    #[test]
    fn test_commit_replaces_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArchivePaths::from_basename(&dir.path().join("plane_0"));

        let mut first = ArchiveWriter::create(paths.clone()).unwrap();
        first.append(b"old").unwrap();
        first.commit(&index_for(vec![0, 3])).unwrap();

        let mut second = ArchiveWriter::create(paths.clone()).unwrap();
        second.append(b"newer").unwrap();
        second.commit(&index_for(vec![0, 2, 5])).unwrap();

        assert_eq!(fs::read(&paths.blob).unwrap(), b"newer");
        assert_eq!(
            PyramidIndex::load(&paths.index).unwrap().offsets,
            vec![0, 2, 5]
        );
    }

    #[test]
    fn test_unreplaceable_index_keeps_previous_blob() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArchivePaths::from_basename(&dir.path().join("plane_0"));
        fs::write(&paths.blob, b"old").unwrap();
        // A directory cannot be removed as a file or renamed over.
        fs::create_dir(&paths.index).unwrap();
        fs::write(paths.index.join("keep"), b"").unwrap();

        let mut writer = ArchiveWriter::create(paths.clone()).unwrap();
        writer.append(b"newer").unwrap();
        let err = writer.commit(&index_for(vec![0, 5])).unwrap_err();

        assert!(matches!(err, TarzoomError::WriteFailed { .. }));
        assert_eq!(fs::read(&paths.blob).unwrap(), b"old");
    }

    #[cfg(unix)]
    #[test]
    fn test_published_files_use_default_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        fs::File::create(&reference).unwrap();
        let expected = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        let paths = ArchivePaths::from_basename(&dir.path().join("plane_0"));
        let mut writer = ArchiveWriter::create(paths.clone()).unwrap();
        writer.append(b"abc").unwrap();
        writer.commit(&index_for(vec![0, 3])).unwrap();

        for path in [&paths.blob, &paths.index] {
            let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, expected, "{}", path.display());
        }
    }

    #[test]
    fn test_create_makes_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArchivePaths::from_basename(&dir.path().join("nested/out/planes"));
        let writer = ArchiveWriter::create(paths).unwrap();
        writer.commit(&index_for(vec![0])).unwrap();
        assert!(dir.path().join("nested/out/planes.tzi").exists());
    }
}

//! Concrete implementations of the service traits.
//!
//! These wrap the tarzoom library, routing its log messages to `tracing`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::traits::{ArchiveReport, ArchiveService, Output};
use crate::error::CliError;
use tarzoom::archive::{self, Archive};
use tarzoom::batch::{self, FolderPackOptions};
use tarzoom::index::PyramidIndex;
use tarzoom::interleave::{InterleaveOptions, InterleaveSummary, PlaneInterleaver};
use tarzoom::log::{Logger, TracingLogger};
use tarzoom::output::ArchivePaths;
use tarzoom::pack::{PackOptions, PackSummary, PyramidPacker};

// ============================================================================
// Console Output Implementation
// ============================================================================

/// Standard console output implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    /// Create a new console output.
    pub fn new() -> Self {
        Self
    }
}

impl Output for ConsoleOutput {
    fn println(&self, message: &str) {
        println!("{}", message);
    }
}

// ============================================================================
// Default Archive Service Implementation
// ============================================================================

/// Archive service backed by the tarzoom library.
pub struct DefaultArchiveService {
    logger: Arc<dyn Logger>,
}

impl DefaultArchiveService {
    /// Create a service that logs through `tracing`.
    pub fn new() -> Self {
        Self {
            logger: Arc::new(TracingLogger),
        }
    }
}

impl Default for DefaultArchiveService {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveService for DefaultArchiveService {
    fn pack(&self, basename: &Path, options: PackOptions) -> Result<PackSummary, CliError> {
        Ok(PyramidPacker::new(options, Arc::clone(&self.logger)).pack_basename(basename)?)
    }

    fn pack_folder(
        &self,
        input: &Path,
        output: &Path,
        options: FolderPackOptions,
    ) -> Result<Vec<PackSummary>, CliError> {
        Ok(batch::pack_folder(
            input,
            output,
            options,
            Arc::clone(&self.logger),
        )?)
    }

    fn interleave(
        &self,
        planes: &[PathBuf],
        output: &Path,
        options: InterleaveOptions,
    ) -> Result<InterleaveSummary, CliError> {
        Ok(
            PlaneInterleaver::new(options, Arc::clone(&self.logger))
                .interleave_paths(planes, ArchivePaths::from_member(output))?,
        )
    }

    fn interleave_folder(
        &self,
        input: &Path,
        output: &Path,
        options: InterleaveOptions,
    ) -> Result<InterleaveSummary, CliError> {
        Ok(batch::interleave_folder(
            input,
            output,
            options,
            Arc::clone(&self.logger),
        )?)
    }

    fn inspect(&self, path: &Path) -> Result<ArchiveReport, CliError> {
        let archive = Archive::open(path)?;
        Ok(ArchiveReport {
            paths: archive.paths().clone(),
            index: archive.index().clone(),
            stats: archive.stats(),
        })
    }

    fn verify(&self, path: &Path) -> Result<PyramidIndex, CliError> {
        Ok(archive::verify(path)?)
    }

    fn deinterleave(
        &self,
        path: &Path,
        output_dir: &Path,
        prefix: &str,
        max_open_planes: usize,
    ) -> Result<Vec<ArchivePaths>, CliError> {
        let mut archive = Archive::open(path)?;
        Ok(archive.deinterleave(output_dir, prefix, max_open_planes)?)
    }
}

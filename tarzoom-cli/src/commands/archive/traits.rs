//! Core traits for the command handler pattern.
//!
//! Handlers depend on these interfaces only, so each one can be tested
//! with mock output and a mock archive service.

use std::path::{Path, PathBuf};

use crate::error::CliError;
use tarzoom::archive::ArchiveStats;
use tarzoom::batch::FolderPackOptions;
use tarzoom::config::ConfigFile;
use tarzoom::index::PyramidIndex;
use tarzoom::interleave::{InterleaveOptions, InterleaveSummary};
use tarzoom::output::ArchivePaths;
use tarzoom::pack::{PackOptions, PackSummary};

/// What `inspect` reports about an archive.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub paths: ArchivePaths,
    pub index: PyramidIndex,
    pub stats: ArchiveStats,
}

// ============================================================================
// Output Trait - Abstracts console output
// ============================================================================

/// Trait for outputting messages to the user.
///
/// This abstraction allows handlers to produce output without depending on
/// `println!` directly, making them testable.
pub trait Output: Send + Sync {
    /// Print a line of text.
    fn println(&self, message: &str);

    /// Print an empty line.
    fn newline(&self) {
        self.println("");
    }

    /// Print a section header.
    fn header(&self, title: &str) {
        self.println(title);
        self.println(&"=".repeat(title.len()));
    }

    /// Print an indented line.
    fn indented(&self, message: &str) {
        self.println(&format!("  {}", message));
    }
}

// ============================================================================
// Archive Service Trait - Abstracts library operations
// ============================================================================

/// Trait for archive operations.
///
/// Each method corresponds to one library entry point.
pub trait ArchiveService: Send + Sync {
    /// Pack one pyramid next to its descriptor.
    fn pack(&self, basename: &Path, options: PackOptions) -> Result<PackSummary, CliError>;

    /// Pack every plane pyramid in a folder.
    fn pack_folder(
        &self,
        input: &Path,
        output: &Path,
        options: FolderPackOptions,
    ) -> Result<Vec<PackSummary>, CliError>;

    /// Interleave the given planes into `output`.
    fn interleave(
        &self,
        planes: &[PathBuf],
        output: &Path,
        options: InterleaveOptions,
    ) -> Result<InterleaveSummary, CliError>;

    /// Interleave every plane archive in a folder.
    fn interleave_folder(
        &self,
        input: &Path,
        output: &Path,
        options: InterleaveOptions,
    ) -> Result<InterleaveSummary, CliError>;

    /// Open an archive and summarize it.
    fn inspect(&self, archive: &Path) -> Result<ArchiveReport, CliError>;

    /// Check an archive's index and blob.
    fn verify(&self, archive: &Path) -> Result<PyramidIndex, CliError>;

    /// Split an interleaved archive into per-plane archives, keeping at
    /// most `max_open_planes` outputs open at once.
    fn deinterleave(
        &self,
        archive: &Path,
        output_dir: &Path,
        prefix: &str,
        max_open_planes: usize,
    ) -> Result<Vec<ArchivePaths>, CliError>;
}

// ============================================================================
// Command Context - Bundles dependencies for handlers
// ============================================================================

/// Context providing dependencies to command handlers.
pub struct CommandContext<'a> {
    /// Output interface for user messages.
    pub output: &'a dyn Output,

    /// Archive service for library operations.
    pub service: &'a dyn ArchiveService,

    /// Loaded configuration; command-line flags take precedence.
    pub config: &'a ConfigFile,
}

impl<'a> CommandContext<'a> {
    /// Create a new command context.
    pub fn new(
        output: &'a dyn Output,
        service: &'a dyn ArchiveService,
        config: &'a ConfigFile,
    ) -> Self {
        Self {
            output,
            service,
            config,
        }
    }
}

// ============================================================================
// Command Handler Trait
// ============================================================================

/// Trait for command handlers.
///
/// Handlers receive their arguments and a context providing dependencies.
pub trait CommandHandler {
    /// The arguments type for this handler.
    type Args;

    /// Execute the command with the given arguments and context.
    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError>;
}

//! Argument types and CLI definitions for archive commands.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use tarzoom::pyramid::MissingTilePolicy;

/// Missing tile policy argument for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingTilesArg {
    /// Abort when a grid cell has no tile file
    Error,
    /// Record a zero-length range for the cell
    Empty,
}

impl From<MissingTilesArg> for MissingTilePolicy {
    fn from(arg: MissingTilesArg) -> Self {
        match arg {
            MissingTilesArg::Error => MissingTilePolicy::Error,
            MissingTilesArg::Empty => MissingTilePolicy::Empty,
        }
    }
}

/// Archive subcommands.
#[derive(Debug, Subcommand)]
pub enum ArchiveCommands {
    /// Pack <BASENAME>.dzi + <BASENAME>_files/ into <BASENAME>.tzb + .tzi
    Pack {
        /// Pyramid base name (path without the .dzi extension)
        basename: PathBuf,

        /// How to treat grid cells without a tile file
        #[arg(long, value_enum)]
        missing_tiles: Option<MissingTilesArg>,

        /// Remove the descriptor and tile directory after packing
        #[arg(long)]
        delete_sources: bool,
    },

    /// Pack every plane_<n>.dzi pyramid in a folder
    PackFolder {
        /// Folder containing plane_<n>.dzi and plane_<n>_files/
        input: PathBuf,

        /// Folder for plane_<n>.tzb/.tzi (defaults to INPUT)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Pack planes concurrently
        #[arg(long)]
        parallel: bool,

        /// Remove each pyramid after it is packed
        #[arg(long)]
        delete_sources: bool,
    },

    /// Interleave single-plane archives into one archive
    Interleave {
        /// Plane archives in plane order (.tzi, .tzb or base name)
        #[arg(required = true)]
        planes: Vec<PathBuf>,

        /// Output base name (writes <OUTPUT>.tzb and <OUTPUT>.tzi)
        #[arg(long, short)]
        output: PathBuf,

        /// Skip the tile size, overlap, format, size and level checks
        #[arg(long)]
        no_validate: bool,
    },

    /// Interleave every plane_<n>.tzi in a folder into planes.tzb/.tzi
    InterleaveFolder {
        /// Folder containing plane_<n>.tzb and plane_<n>.tzi
        input: PathBuf,

        /// Folder for planes.tzb/.tzi (defaults to INPUT)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Remove the per-plane archives after interleaving
        #[arg(long)]
        delete_sources: bool,
    },

    /// Show an archive's metadata and size statistics
    Inspect {
        /// Archive (.tzi, .tzb or base name)
        archive: PathBuf,
    },

    /// Check an archive's offsets and blob length
    Verify {
        /// Archive (.tzi, .tzb or base name)
        archive: PathBuf,
    },

    /// Split an interleaved archive back into per-plane archives
    Deinterleave {
        /// Interleaved archive (.tzi, .tzb or base name)
        archive: PathBuf,

        /// Folder for <PREFIX>_<n>.tzb/.tzi
        #[arg(long, short)]
        output: PathBuf,

        /// File name prefix of the per-plane archives
        #[arg(long, default_value = "plane")]
        prefix: String,
    },
}

/// Arguments for the pack command.
#[derive(Debug, Clone)]
pub struct PackArgs {
    pub basename: PathBuf,
    pub missing_tiles: Option<MissingTilesArg>,
    pub delete_sources: bool,
}

/// Arguments for the pack-folder command.
#[derive(Debug, Clone)]
pub struct PackFolderArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub parallel: bool,
    pub delete_sources: bool,
}

/// Arguments for the interleave command.
#[derive(Debug, Clone)]
pub struct InterleaveArgs {
    pub planes: Vec<PathBuf>,
    pub output: PathBuf,
    pub no_validate: bool,
}

/// Arguments for the interleave-folder command.
#[derive(Debug, Clone)]
pub struct InterleaveFolderArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub delete_sources: bool,
}

/// Arguments for the inspect command.
#[derive(Debug, Clone)]
pub struct InspectArgs {
    pub archive: PathBuf,
}

/// Arguments for the verify command.
#[derive(Debug, Clone)]
pub struct VerifyArgs {
    pub archive: PathBuf,
}

/// Arguments for the deinterleave command.
#[derive(Debug, Clone)]
pub struct DeinterleaveArgs {
    pub archive: PathBuf,
    pub output: PathBuf,
    pub prefix: String,
}

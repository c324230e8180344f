//! tarzoom - pack Deep Zoom tile pyramids into two-file archives
//!
//! A pyramid on disk is a `<name>.dzi` descriptor plus thousands of small
//! tile files under `<name>_files/<level>/<col>_<row>.<ext>`. This library
//! concatenates those tiles into `<name>.tzb` and records where each one
//! starts in the JSON index `<name>.tzi`, so a viewer can fetch any tile with
//! a single HTTP range request.
//!
//! Multi-plane datasets (one pyramid per light direction, for example) can
//! then be interleaved, so all planes of one tile sit next to each other and
//! arrive in one request.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tarzoom::interleave::{InterleaveOptions, PlaneInterleaver};
//! use tarzoom::log::TracingLogger;
//! use tarzoom::output::ArchivePaths;
//! use tarzoom::pack::{PackOptions, PyramidPacker};
//!
//! let logger = Arc::new(TracingLogger);
//! let packer = PyramidPacker::new(PackOptions::default(), logger.clone());
//! packer.pack_basename(Path::new("scan/plane_0"))?;
//! packer.pack_basename(Path::new("scan/plane_1"))?;
//!
//! PlaneInterleaver::new(InterleaveOptions::default(), logger).interleave_paths(
//!     &["scan/plane_0.tzi".into(), "scan/plane_1.tzi".into()],
//!     ArchivePaths::from_basename(Path::new("scan/planes")),
//! )?;
//! # Ok::<(), tarzoom::error::TarzoomError>(())
//! ```

pub mod archive;
pub mod batch;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod index;
pub mod interleave;
pub mod log;
pub mod logging;
pub mod output;
pub mod pack;
pub mod pyramid;

pub use error::{TarzoomError, TarzoomResult};

/// Version of the tarzoom library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! CLI command implementations.
//!
//! - [`archive`] - Packing, interleaving and reading archives
//! - [`config`] - Configuration file management (path, show, init)

pub mod archive;
pub mod config;

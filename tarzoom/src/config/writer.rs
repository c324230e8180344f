//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[pack]
; What to do when a level's grid has a cell with no tile file:
;   error - abort the pack (default)
;   empty - record a zero-length range for the cell
missing_tiles = {}
; Remove <name>.dzi and <name>_files/ after a successful pack
delete_sources = {}
; Pack planes concurrently when packing a folder
parallel = {}

[interleave]
; Reject planes whose tile size, overlap, format, size or level count differ
validate_geometry = {}
; Above this many planes, blobs are reopened for every tile instead of
; being held open for the whole run
max_open_planes = {}
; Remove plane_<n>.tzb/.tzi after a successful folder interleave
delete_sources = {}

[logging]
; Log file location
file = {}
"#,
        config.pack.missing_tiles,
        config.pack.delete_sources,
        config.pack.parallel,
        config.interleave.validate_geometry,
        config.interleave.max_open_planes,
        config.interleave.delete_sources,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
/// Unknown sections and keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [pack] section
    if let Some(section) = ini.section(Some("pack")) {
        if let Some(v) = section.get("missing_tiles") {
            config.pack.missing_tiles =
                v.parse().map_err(|reason| ConfigFileError::InvalidValue {
                    section: "pack".to_string(),
                    key: "missing_tiles".to_string(),
                    value: v.to_string(),
                    reason,
                })?;
        }
        if let Some(v) = section.get("delete_sources") {
            config.pack.delete_sources = parse_bool("pack", "delete_sources", v)?;
        }
        if let Some(v) = section.get("parallel") {
            config.pack.parallel = parse_bool("pack", "parallel", v)?;
        }
    }

    // [interleave] section
    if let Some(section) = ini.section(Some("interleave")) {
        if let Some(v) = section.get("validate_geometry") {
            config.interleave.validate_geometry =
                parse_bool("interleave", "validate_geometry", v)?;
        }
        if let Some(v) = section.get("max_open_planes") {
            config.interleave.max_open_planes = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "interleave".to_string(),
                    key: "max_open_planes".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer".to_string(),
                })?;
        }
        if let Some(v) = section.get("delete_sources") {
            config.interleave.delete_sources = parse_bool("interleave", "delete_sources", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse a boolean, accepting `true/false`, `yes/no`, `on/off` and `1/0`.
pub(super) fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

//! Output formatting utilities for archive commands.

use super::traits::{ArchiveReport, Output};
use tarzoom::interleave::InterleaveSummary;
use tarzoom::pack::PackSummary;

/// Format a byte count with a binary unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Print the result of packing one pyramid.
pub fn print_pack_summary(out: &dyn Output, summary: &PackSummary) {
    out.println(&format!(
        "Packed {} tiles in {} levels ({})",
        summary.tiles,
        summary.levels,
        format_bytes(summary.bytes)
    ));
    out.indented(&format!("blob:  {}", summary.archive.blob.display()));
    out.indented(&format!("index: {}", summary.archive.index.display()));
    if summary.holes > 0 {
        out.indented(&format!("{} missing tiles packed as empty", summary.holes));
    }
    if summary.sources_deleted {
        out.indented("sources removed");
    }
}

/// Print the result of an interleaving run.
pub fn print_interleave_summary(out: &dyn Output, summary: &InterleaveSummary) {
    out.println(&format!(
        "Interleaved {} planes of {} tiles ({})",
        summary.planes,
        summary.tiles,
        format_bytes(summary.bytes)
    ));
    out.indented(&format!("blob:  {}", summary.archive.blob.display()));
    out.indented(&format!("index: {}", summary.archive.index.display()));
    if summary.sources_deleted {
        out.indented("plane archives removed");
    }
}

/// Print archive metadata and size statistics.
pub fn print_report(out: &dyn Output, report: &ArchiveReport) {
    let index = &report.index;
    let stats = &report.stats;

    out.header(&report.paths.index.display().to_string());
    out.println(&format!("Image:      {}x{}", index.width, index.height));
    out.println(&format!(
        "Tiles:      {}px, overlap {}, {}",
        index.tile_size, index.overlap, index.format
    ));
    out.println(&format!("Levels:     {}", index.levels));
    if index.is_interleaved() {
        out.println(&format!(
            "Layout:     interleaved, {} planes",
            stats.stride
        ));
    } else {
        out.println("Layout:     single plane");
    }
    out.println(&format!("Positions:  {}", stats.tiles));
    out.println(&format!("Ranges:     {}", stats.ranges));
    out.println(&format!(
        "Blob:       {} ({} bytes)",
        format_bytes(stats.bytes),
        stats.bytes
    ));
    out.println(&format!(
        "Range size: {} to {}",
        format_bytes(stats.smallest),
        format_bytes(stats.largest)
    ));
    if stats.empty > 0 {
        out.println(&format!("Empty:      {}", stats.empty));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}

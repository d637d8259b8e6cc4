//! Locations next to the executable, so a standalone build keeps its files
//! beside the binary.

use std::path::PathBuf;

/// Directory containing the running executable. Falls back to the current
/// directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Where PNG snapshots are written.
pub fn images_directory() -> PathBuf {
    exe_directory().join("images")
}

//! Persisted display-mode toggles.
//!
//! The toggle command is the only writer of this file. Reports read it to pick
//! the time rendering for their editing context.

use std::path::Path;

use anyhow::{Context, Result};
use cb_core::DisplayModes;

/// Loads toggled display modes from `path`.
///
/// Returns empty modes if the file doesn't exist.
/// Returns an error if the file exists but is unreadable/unparseable.
pub fn load_display_modes(path: &Path) -> Result<DisplayModes> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DisplayModes::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Writes toggled display modes to `path`, creating parent directories.
pub fn save_display_modes(path: &Path, modes: &DisplayModes) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create state directory")?;
    }
    let json = serde_json::to_string_pretty(modes).context("failed to serialize display modes")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

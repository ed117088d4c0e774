use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::Briefing;

/// Write a text artifact, creating parent directories as needed.
pub fn save_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Dump the briefing as pretty-printed JSON for debugging.
pub fn save_briefing_json(briefing: &Briefing, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(briefing).context("Failed to serialize briefing data")?;
    save_text(path, &json)
}

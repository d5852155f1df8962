//! Durable file output.
//!
//! The generated product description is the one artifact marginalia leaves on
//! disk; it is written through a temp file in the destination directory and
//! renamed into place so readers never observe a half-written document.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `content` to `path` atomically, creating parent directories.
///
/// Line endings are normalized to `\n` and a trailing newline is ensured.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut normalized = content.replace("\r\n", "\n");
    if !normalized.ends_with('\n') {
        normalized.push('\n');
    }

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    temp.write_all(normalized.as_bytes())
        .context("Failed to write temp file")?;
    temp.as_file().sync_all().context("Failed to sync temp file")?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move temp file into place: {}", path.display()))?;

    Ok(())
}

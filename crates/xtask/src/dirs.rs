//! Platform-specific directory utilities

use anyhow::{Context, Result};
use client_bootstrap::ClientConfig;
use std::path::{Path, PathBuf};

/// Log directory used by the client: `SLASHER_LOG_DIR`, or the platform
/// cache directory.
pub fn log_dir() -> PathBuf {
    ClientConfig::from_env().resolved_log_dir()
}

/// Log files in `log_dir`, newest first.
pub fn list_log_files(log_dir: &Path) -> Result<Vec<PathBuf>> {
    if !log_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory: {}", log_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("slasher.log"))
        {
            files.push((path, entry.metadata()?.modified()?));
        }
    }

    files.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(files.into_iter().map(|(path, _)| path).collect())
}

//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Create an empty temporary file next to `dest`, for writing `dest` atomically.
pub fn temp_file_for(dest: &Path) -> Result<NamedTempFile> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".zigwheel-")
        .suffix(".part")
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))
}

/// Move a finished temporary file to `dest`.
pub fn persist(file: NamedTempFile, dest: &Path) -> Result<()> {
    file.persist(dest)
        .map(|_| ())
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", dest.display()))
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let pattern_str = format!(
            "{}/{}",
            glob::Pattern::escape(&base.to_string_lossy()),
            pattern
        );

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// All regular files under `root`, sorted by path.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Archive member name for `path` relative to `base`, always `/`-separated.
///
/// `.` components are ignored, so `./src/a.zig` is inside `.`.
pub fn archive_name(base: &Path, path: &Path) -> Result<String> {
    let base_parts: Vec<Component> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let path_parts: Vec<Component> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if !path_parts.starts_with(&base_parts) {
        bail!("{} is not inside {}", path.display(), base.display());
    }

    let parts: Vec<String> = path_parts[base_parts.len()..]
        .iter()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    Ok(parts.join("/"))
}

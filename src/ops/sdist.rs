//! Source distribution assembly.

use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, Header, HeaderMode};

use crate::core::manifest::ProjectManifest;
use crate::ops::metadata::render_metadata;
use crate::util::fs::{archive_name, ensure_dir, glob_files, persist, temp_file_for};

/// Project files copied into every sdist when present.
pub const SDIST_FILES: &[&str] = &[
    "pyproject.toml",
    "README.md",
    "README.rst",
    "LICENSE",
    "LICENSE.txt",
    "CHANGELOG.md",
];

/// Glob patterns, relative to the project root, of files in the sdist.
pub fn sdist_patterns(project: &ProjectManifest) -> Vec<String> {
    let src = project
        .build
        .src_dir
        .to_string_lossy()
        .replace('\\', "/");
    let src = src.trim_end_matches('/');

    let mut patterns: Vec<String> = SDIST_FILES.iter().map(|s| s.to_string()).collect();
    patterns.push(format!("{}/**/*.zig", src));
    patterns.push("*.zig".to_string());
    patterns
}

/// Write `{name}-{version}.tar.gz` into `output_dir` and return its name.
///
/// Nothing is compiled.
pub fn build_sdist(project: &ProjectManifest, output_dir: &Path) -> Result<String> {
    let base = format!(
        "{}-{}",
        project.metadata.escaped_name(),
        project.metadata.escaped_version()
    );
    let file_name = format!("{}.tar.gz", base);

    ensure_dir(output_dir)?;
    let dest = output_dir.join(&file_name);
    let out = temp_file_for(&dest)?;

    let mut tar = Builder::new(GzEncoder::new(out, Compression::default()));
    tar.mode(HeaderMode::Deterministic);

    let files = glob_files(&project.root, &sdist_patterns(project))?;
    for file in &files {
        let name = format!("{}/{}", base, archive_name(&project.root, file)?);
        tracing::debug!("Adding {}", name);
        tar.append_path_with_name(file, &name)
            .with_context(|| format!("failed to add {} to sdist", file.display()))?;
    }

    let pkg_info = render_metadata(&project.metadata, &project.root);
    let mut header = Header::new_gnu();
    header.set_size(pkg_info.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    tar.append_data(&mut header, format!("{}/PKG-INFO", base), pkg_info.as_bytes())
        .context("failed to add PKG-INFO to sdist")?;

    let encoder = tar.into_inner().context("failed to finish sdist archive")?;
    let out = encoder
        .finish()
        .with_context(|| format!("failed to write sdist: {}", dest.display()))?;
    persist(out, &dest)?;

    tracing::info!("Built {} ({} files)", dest.display(), files.len() + 1);
    Ok(file_name)
}

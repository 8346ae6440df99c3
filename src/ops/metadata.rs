//! Core metadata files of a wheel's `.dist-info` directory.

use std::path::Path;

use anyhow::Result;

use crate::core::manifest::{Author, PackageMetadata, ProjectManifest};
use crate::core::tags::WheelTag;
use crate::util::fs::{ensure_dir, write_string};

/// Core metadata version written on the first METADATA line.
pub const METADATA_VERSION: &str = "2.1";

/// Wheel format version written into WHEEL.
pub const WHEEL_VERSION: &str = "1.0";

/// Value of the WHEEL `Generator:` field.
pub fn generator() -> String {
    format!("zigwheel {}", env!("CARGO_PKG_VERSION"))
}

/// Render the METADATA file.
///
/// Fields appear in a fixed order and absent optional fields are omitted.
/// A readme that can be read from `project_root` becomes the message body.
pub fn render_metadata(meta: &PackageMetadata, project_root: &Path) -> String {
    let mut lines = vec![
        format!("Metadata-Version: {}", METADATA_VERSION),
        format!("Name: {}", single_line(&meta.name)),
        format!("Version: {}", single_line(&meta.version)),
    ];

    if let Some(summary) = &meta.summary {
        lines.push(format!("Summary: {}", single_line(summary)));
    }

    if let Some(requires) = &meta.requires_python {
        lines.push(format!("Requires-Python: {}", single_line(requires)));
    }

    if let Some(license) = meta.license.as_ref().and_then(|l| l.display_text()) {
        lines.push(format!("License: {}", single_line(license)));
    }

    lines.extend(meta.authors.iter().filter_map(author_line));

    for classifier in &meta.classifiers {
        lines.push(format!("Classifier: {}", single_line(classifier)));
    }

    for dep in &meta.dependencies {
        lines.push(format!("Requires-Dist: {}", single_line(dep)));
    }

    for (extra, deps) in &meta.optional_dependencies {
        lines.push(format!("Provides-Extra: {}", single_line(extra)));
        for dep in deps {
            lines.push(format!(
                "Requires-Dist: {}",
                single_line(&extra_requirement(dep, extra))
            ));
        }
    }

    for (label, url) in &meta.urls {
        lines.push(format!("Project-URL: {}, {}", single_line(label), single_line(url)));
    }

    let body = meta.readme.as_ref().and_then(|readme| {
        let file = readme.file()?;
        match std::fs::read_to_string(project_root.join(file)) {
            Ok(text) => Some((readme.content_type().to_string(), text)),
            Err(e) => {
                tracing::warn!("Skipping readme {}: {}", file, e);
                None
            }
        }
    });

    let mut out = String::new();
    if let Some((content_type, _)) = &body {
        lines.push(format!("Description-Content-Type: {}", content_type));
    }
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }

    if let Some((_, text)) = body {
        out.push('\n');
        out.push_str(&text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

fn author_line(author: &Author) -> Option<String> {
    let name = author.name.as_deref().map(single_line).filter(|s| !s.is_empty());
    let email = author.email.as_deref().map(single_line).filter(|s| !s.is_empty());
    match (name, email) {
        (Some(name), Some(email)) => Some(format!("Author-Email: {} <{}>", name, email)),
        (Some(name), None) => Some(format!("Author: {}", name)),
        (None, Some(email)) => Some(format!("Author-Email: {}", email)),
        (None, None) => None,
    }
}

/// Attach an `extra == "name"` marker to a requirement.
fn extra_requirement(dep: &str, extra: &str) -> String {
    match dep.split_once(';') {
        Some((req, marker)) => format!(
            "{}; ({}) and extra == \"{}\"",
            req.trim(),
            marker.trim(),
            extra
        ),
        None => format!("{}; extra == \"{}\"", dep.trim(), extra),
    }
}

/// Collapse whitespace, including newlines, so a value stays on its header line.
fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render the WHEEL file.
pub fn render_wheel(tag: &WheelTag) -> String {
    format!(
        "Wheel-Version: {}\nGenerator: {}\nRoot-Is-Purelib: false\nTag: {}\n",
        WHEEL_VERSION,
        generator(),
        tag
    )
}

/// Write METADATA and WHEEL into `dist_info_dir`.
pub fn write_metadata_files(
    dist_info_dir: &Path,
    project: &ProjectManifest,
    tag: &WheelTag,
) -> Result<()> {
    ensure_dir(dist_info_dir)?;
    write_string(
        &dist_info_dir.join("METADATA"),
        &render_metadata(&project.metadata, &project.root),
    )?;
    write_string(&dist_info_dir.join("WHEEL"), &render_wheel(tag))
}

/// Write the `.dist-info` directory into `metadata_dir` and return its name.
pub fn prepare_metadata(
    project: &ProjectManifest,
    metadata_dir: &Path,
    tag: &WheelTag,
) -> Result<String> {
    let dist_info = project.metadata.dist_info_name();
    write_metadata_files(&metadata_dir.join(&dist_info), project, tag)?;
    tracing::debug!("Prepared {} in {}", dist_info, metadata_dir.display());
    Ok(dist_info)
}

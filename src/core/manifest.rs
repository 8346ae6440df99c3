//! pyproject.toml parsing.
//!
//! Reads the `[project]` table into [`PackageMetadata`] and the
//! `[tool.zigwheel]` table into [`BuildConfig`]. Absent keys fall back to
//! the documented defaults; a missing file is a configuration error.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::core::error::BuildError;

/// Name of the project configuration file.
pub const MANIFEST_NAME: &str = "pyproject.toml";

/// An author entry from `[project].authors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The `license` key, either a bare string or a table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum License {
    Text(String),
    Table {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        file: Option<String>,
    },
}

impl License {
    /// The value emitted on the `License:` metadata line, if any.
    pub fn display_text(&self) -> Option<&str> {
        let text = match self {
            License::Text(s) => Some(s.as_str()),
            License::Table { text: Some(t), .. } => Some(t.as_str()),
            License::Table { file: Some(f), .. } => Some(f.as_str()),
            License::Table { .. } => None,
        };
        text.filter(|s| !s.is_empty())
    }
}

/// The `readme` key, either a path or a table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Readme {
    Path(String),
    Table {
        #[serde(default)]
        file: Option<String>,
        #[serde(default, rename = "content-type")]
        content_type: Option<String>,
    },
}

impl Readme {
    /// Path of the readme file relative to the project root.
    pub fn file(&self) -> Option<&str> {
        match self {
            Readme::Path(p) => Some(p.as_str()),
            Readme::Table { file, .. } => file.as_deref(),
        }
    }

    /// Content type, explicit or inferred from the file extension.
    pub fn content_type(&self) -> &str {
        if let Readme::Table {
            content_type: Some(ct),
            ..
        } = self
        {
            return ct;
        }
        match self.file().and_then(|f| Path::new(f).extension()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") => "text/markdown",
            Some(ext) if ext.eq_ignore_ascii_case("rst") => "text/x-rst",
            _ => "text/plain",
        }
    }
}

/// Project metadata, passed through to the package assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub license: Option<License>,
    pub authors: Vec<Author>,
    pub readme: Option<Readme>,
    pub requires_python: Option<String>,
    pub classifiers: Vec<String>,
    pub dependencies: Vec<String>,
    /// Extra name -> requirements, in declaration order.
    pub optional_dependencies: Vec<(String, Vec<String>)>,
    /// Label -> URL, in declaration order.
    pub urls: Vec<(String, String)>,
}

impl PackageMetadata {
    /// Metadata with just a name and version; everything else absent.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PackageMetadata {
            name: name.into(),
            version: version.into(),
            summary: None,
            license: None,
            authors: Vec::new(),
            readme: None,
            requires_python: None,
            classifiers: Vec::new(),
            dependencies: Vec::new(),
            optional_dependencies: Vec::new(),
            urls: Vec::new(),
        }
    }

    /// The distribution name escaped for use in file names.
    ///
    /// Runs of `-`, `_` and `.` collapse to a single `_`.
    pub fn escaped_name(&self) -> String {
        escape_component(&self.name)
    }

    /// The version escaped for use in file names.
    pub fn escaped_version(&self) -> String {
        self.version.replace('-', "_")
    }

    /// `{name}-{version}.dist-info`
    pub fn dist_info_name(&self) -> String {
        format!("{}-{}.dist-info", self.escaped_name(), self.escaped_version())
    }
}

fn escape_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Build settings from `[tool.zigwheel]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Zig source directory, relative to the project root.
    pub src_dir: PathBuf,
    /// Python package name of the generated module.
    pub module_name: String,
    /// Optimize (`-OReleaseFast`) instead of `-ODebug`.
    pub release: bool,
    /// Pass `-fstrip` to the compiler.
    pub strip: bool,
    /// Wrap native calls in the GIL release scope.
    pub lock_release: bool,
    /// Declared features. Recorded but not forwarded to the compiler.
    pub features: Vec<String>,
}

/// Turn a project name into a valid Python identifier.
pub fn sanitize_module_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// A loaded pyproject.toml.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    pub metadata: PackageMetadata,
    pub build: BuildConfig,
    /// Directory containing the manifest.
    pub root: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    project: RawProject,
    #[serde(default)]
    tool: RawTool,
}

#[derive(Debug, Default, Deserialize)]
struct RawProject {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    #[serde(default)]
    authors: Vec<Author>,
    license: Option<License>,
    readme: Option<Readme>,
    #[serde(rename = "requires-python")]
    requires_python: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: toml::Table,
    #[serde(default)]
    classifiers: Vec<String>,
    #[serde(default)]
    urls: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
struct RawTool {
    #[serde(default)]
    zigwheel: RawBuildConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawBuildConfig {
    #[serde(default = "default_src")]
    src: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default = "default_true")]
    release: bool,
    #[serde(default = "default_true")]
    strip: bool,
    #[serde(default = "default_true", alias = "gil-release")]
    lock_release: bool,
    #[serde(default)]
    features: Vec<String>,
}

impl Default for RawBuildConfig {
    fn default() -> Self {
        RawBuildConfig {
            src: default_src(),
            module: None,
            release: true,
            strip: true,
            lock_release: true,
            features: Vec::new(),
        }
    }
}

fn default_src() -> String {
    "src".to_string()
}

fn default_true() -> bool {
    true
}

/// Name of the project directory; `.` and `..` resolve against the cwd.
fn default_project_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            std::fs::canonicalize(project_dir)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "project".to_string())
}

impl ProjectManifest {
    /// Load `pyproject.toml` from a project directory.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(MANIFEST_NAME);
        if !path.is_file() {
            return Err(BuildError::ConfigNotFound {
                dir: project_dir.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| BuildError::ConfigInvalid {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Self::parse(&content, project_dir)
    }

    /// Parse manifest content for a project rooted at `project_dir`.
    pub fn parse(content: &str, project_dir: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| BuildError::ConfigInvalid {
            path: project_dir.join(MANIFEST_NAME),
            message: e.to_string(),
        })?;

        let name = raw
            .project
            .name
            .unwrap_or_else(|| default_project_name(project_dir));

        let metadata = PackageMetadata {
            version: raw.project.version.unwrap_or_else(|| "0.1.0".to_string()),
            summary: raw.project.description.filter(|d| !d.is_empty()),
            license: raw.project.license,
            authors: raw.project.authors,
            readme: raw.project.readme,
            requires_python: Some(
                raw.project
                    .requires_python
                    .unwrap_or_else(|| ">=3.8".to_string()),
            ),
            classifiers: raw.project.classifiers,
            dependencies: raw.project.dependencies,
            optional_dependencies: convert_extras(raw.project.optional_dependencies),
            urls: convert_urls(raw.project.urls),
            name,
        };

        let tool = raw.tool.zigwheel;
        let module_name = tool
            .module
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| sanitize_module_name(&metadata.name));

        let build = BuildConfig {
            src_dir: PathBuf::from(tool.src),
            module_name,
            release: tool.release,
            strip: tool.strip,
            lock_release: tool.lock_release,
            features: tool.features,
        };

        Ok(ProjectManifest {
            metadata,
            build,
            root: project_dir.to_path_buf(),
        })
    }

    /// Absolute path of the Zig source directory.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join(&self.build.src_dir)
    }
}

fn convert_urls(table: toml::Table) -> Vec<(String, String)> {
    table
        .into_iter()
        .filter_map(|(label, value)| match value {
            toml::Value::String(url) => Some((label, url)),
            other => {
                tracing::warn!("ignoring non-string project URL `{}`: {}", label, other);
                None
            }
        })
        .collect()
}

fn convert_extras(table: toml::Table) -> Vec<(String, Vec<String>)> {
    table
        .into_iter()
        .map(|(extra, value)| {
            let deps = match value {
                toml::Value::Array(items) => items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            (extra, deps)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_manifest() {
        let content = r#"
[project]
name = "my-ext"
version = "1.2.0"
description = "Fast things"
license = { text = "MIT" }
authors = [
  { name = "Ada", email = "ada@example.com" },
  { name = "Grace" },
]
requires-python = ">=3.9"
dependencies = ["numpy>=1.20"]
classifiers = ["Programming Language :: Python :: 3"]

[project.optional-dependencies]
test = ["pytest"]

[project.urls]
Homepage = "https://example.com"
Source = "https://example.com/src"

[tool.zigwheel]
src = "zig"
release = false
gil-release = false
features = ["simd"]
"#;
        let tmp = TempDir::new().unwrap();
        let manifest = ProjectManifest::parse(content, tmp.path()).unwrap();

        let meta = &manifest.metadata;
        assert_eq!(meta.name, "my-ext");
        assert_eq!(meta.version, "1.2.0");
        assert_eq!(meta.summary.as_deref(), Some("Fast things"));
        assert_eq!(meta.license.as_ref().unwrap().display_text(), Some("MIT"));
        assert_eq!(meta.authors.len(), 2);
        assert_eq!(meta.requires_python.as_deref(), Some(">=3.9"));
        assert_eq!(
            meta.optional_dependencies,
            vec![("test".to_string(), vec!["pytest".to_string()])]
        );
        assert_eq!(meta.urls[0].0, "Homepage");
        assert_eq!(meta.urls[1].0, "Source");

        let build = &manifest.build;
        assert_eq!(build.src_dir, PathBuf::from("zig"));
        assert_eq!(build.module_name, "my_ext");
        assert!(!build.release);
        assert!(build.strip);
        assert!(!build.lock_release);
        assert_eq!(build.features, vec!["simd".to_string()]);
        assert_eq!(manifest.src_dir(), tmp.path().join("zig"));
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("fallback-name");
        std::fs::create_dir_all(&project).unwrap();

        let manifest = ProjectManifest::parse("", &project).unwrap();
        assert_eq!(manifest.metadata.name, "fallback-name");
        assert_eq!(manifest.metadata.version, "0.1.0");
        assert_eq!(manifest.metadata.requires_python.as_deref(), Some(">=3.8"));
        assert_eq!(manifest.build.src_dir, PathBuf::from("src"));
        assert_eq!(manifest.build.module_name, "fallback_name");
        assert!(manifest.build.release);
        assert!(manifest.build.strip);
        assert!(manifest.build.lock_release);
    }

    #[test]
    fn test_default_name_resolves_relative_dirs() {
        let cwd = std::env::current_dir().unwrap();
        let expected = cwd.file_name().unwrap().to_string_lossy().into_owned();
        let manifest = ProjectManifest::parse("", Path::new(".")).unwrap();
        assert_eq!(manifest.metadata.name, expected);
        assert_eq!(manifest.build.module_name, sanitize_module_name(&expected));

        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("outer-dir");
        std::fs::create_dir_all(project.join("inner")).unwrap();
        let manifest = ProjectManifest::parse("", &project.join("inner").join("..")).unwrap();
        assert_eq!(manifest.metadata.name, "outer-dir");
        assert_eq!(manifest.build.module_name, "outer_dir");
    }

    #[test]
    fn test_module_override() {
        let content = r#"
[project]
name = "thing"

[tool.zigwheel]
module = "_thing_native"
lock-release = true
"#;
        let manifest = ProjectManifest::parse(content, Path::new("/tmp/x")).unwrap();
        assert_eq!(manifest.build.module_name, "_thing_native");
    }

    #[test]
    fn test_missing_manifest_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = ProjectManifest::load(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_manifest_is_config_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "[project\nname=").unwrap();
        let err = ProjectManifest::load(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_escaped_names() {
        let meta = PackageMetadata::new("my-ext..core", "1.2.0");
        assert_eq!(meta.escaped_name(), "my_ext_core");
        assert_eq!(meta.dist_info_name(), "my_ext_core-1.2.0.dist-info");
    }

    #[test]
    fn test_sanitize_module_name() {
        assert_eq!(sanitize_module_name("my-ext"), "my_ext");
        assert_eq!(sanitize_module_name("a.b c"), "a_b_c");
        assert_eq!(sanitize_module_name("3d-tools"), "_3d_tools");
    }

    #[test]
    fn test_readme_content_type() {
        assert_eq!(
            Readme::Path("README.md".to_string()).content_type(),
            "text/markdown"
        );
        assert_eq!(
            Readme::Path("README.rst".to_string()).content_type(),
            "text/x-rst"
        );
        let table = Readme::Table {
            file: Some("README".to_string()),
            content_type: Some("text/plain; charset=UTF-8".to_string()),
        };
        assert_eq!(table.content_type(), "text/plain; charset=UTF-8");
    }
}

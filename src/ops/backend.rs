//! Build hooks.
//!
//! One method per hook a Python package installer calls on a build backend:
//! three builds (wheel, sdist, editable), three requirement queries and two
//! metadata preparations. Every call reloads `pyproject.toml` and recomputes
//! the wheel tag.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::bindings::{ExportScanner, ExportedFunction};
use crate::builder::toolchain::{NativeCompiler, ZigCompiler};
use crate::core::manifest::ProjectManifest;
use crate::core::tags::{HostPlatform, Interpreter, WheelTag};
use crate::ops::metadata::prepare_metadata;
use crate::ops::sdist;
use crate::ops::wheel::{self, WheelOptions};

/// Which build a requirement query is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildKind {
    #[default]
    Wheel,
    Sdist,
    Editable,
}

/// A project's build backend.
#[derive(Debug, Clone)]
pub struct Backend {
    project_dir: PathBuf,
    host: HostPlatform,
    interpreter: Option<Interpreter>,
    python: Option<PathBuf>,
    release: Option<bool>,
    strip: Option<bool>,
}

impl Backend {
    /// Backend for the project in `project_dir`, targeting this host.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Backend {
            project_dir: project_dir.into(),
            host: HostPlatform::current(),
            interpreter: None,
            python: None,
            release: None,
            strip: None,
        }
    }

    /// Tag for this interpreter instead of probing one.
    pub fn with_interpreter(mut self, interpreter: Option<Interpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Probe this Python executable for the tag.
    pub fn with_python(mut self, python: Option<PathBuf>) -> Self {
        self.python = python;
        self
    }

    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    /// Override `[tool.zigwheel].release`.
    pub fn with_release(mut self, release: Option<bool>) -> Self {
        self.release = release;
        self
    }

    /// Override `[tool.zigwheel].strip`.
    pub fn with_strip(mut self, strip: Option<bool>) -> Self {
        self.strip = strip;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Load the manifest with command-line overrides applied.
    pub fn manifest(&self) -> Result<ProjectManifest> {
        let mut manifest = ProjectManifest::load(&self.project_dir)?;
        if let Some(release) = self.release {
            manifest.build.release = release;
        }
        if let Some(strip) = self.strip {
            manifest.build.strip = strip;
        }
        Ok(manifest)
    }

    /// The tag of wheels built by this backend.
    pub fn wheel_tag(&self) -> Result<WheelTag> {
        let interpreter = match &self.interpreter {
            Some(interpreter) => interpreter.clone(),
            None => Interpreter::detect(self.python.as_deref())?,
        };
        let tag = WheelTag::compute(&interpreter, &self.host);
        tracing::debug!("Wheel tag: {}", tag);
        Ok(tag)
    }

    /// Exported functions found in the project's sources.
    pub fn exports(&self) -> Result<Vec<ExportedFunction>> {
        let manifest = self.manifest()?;
        Ok(ExportScanner::new().scan_dir(&manifest.src_dir()))
    }

    pub fn build_wheel(&self, wheel_directory: &Path) -> Result<String> {
        let compiler = ZigCompiler::detect()?;
        self.build_wheel_with(wheel_directory, &compiler)
    }

    /// Build a wheel with a specific compiler.
    pub fn build_wheel_with(
        &self,
        wheel_directory: &Path,
        compiler: &dyn NativeCompiler,
    ) -> Result<String> {
        let manifest = self.manifest()?;
        let opts = WheelOptions::new(wheel_directory, self.wheel_tag()?, self.host.clone());
        wheel::build_wheel(&manifest, &opts, compiler)
    }

    pub fn build_editable(&self, wheel_directory: &Path) -> Result<String> {
        let manifest = self.manifest()?;
        let opts = WheelOptions::new(wheel_directory, self.wheel_tag()?, self.host.clone());
        wheel::build_editable(&manifest, &opts)
    }

    pub fn build_sdist(&self, sdist_directory: &Path) -> Result<String> {
        let manifest = self.manifest()?;
        sdist::build_sdist(&manifest, sdist_directory)
    }

    /// Extra build requirements. There are none.
    pub fn get_requires(&self, kind: BuildKind) -> Vec<String> {
        tracing::debug!("No extra requirements for {:?} builds", kind);
        Vec::new()
    }

    pub fn get_requires_for_build_wheel(&self) -> Vec<String> {
        self.get_requires(BuildKind::Wheel)
    }

    pub fn get_requires_for_build_sdist(&self) -> Vec<String> {
        self.get_requires(BuildKind::Sdist)
    }

    pub fn get_requires_for_build_editable(&self) -> Vec<String> {
        self.get_requires(BuildKind::Editable)
    }

    pub fn prepare_metadata_for_build_wheel(&self, metadata_directory: &Path) -> Result<String> {
        let manifest = self.manifest()?;
        prepare_metadata(&manifest, metadata_directory, &self.wheel_tag()?)
    }

    pub fn prepare_metadata_for_build_editable(
        &self,
        metadata_directory: &Path,
    ) -> Result<String> {
        self.prepare_metadata_for_build_wheel(metadata_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::CompileInput;
    use crate::core::error::BuildError;
    use tempfile::TempDir;

    struct FakeCompiler;

    impl NativeCompiler for FakeCompiler {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        fn compile(&self, input: &CompileInput) -> Result<()> {
            assert!(!input.strip);
            assert_eq!(input.optimize.as_str(), "Debug");
            std::fs::write(&input.output, b"lib")?;
            Ok(())
        }
    }

    fn backend(root: &Path) -> Backend {
        Backend::new(root)
            .with_interpreter(Some(Interpreter::new("cpython", 3, 12)))
            .with_host(HostPlatform::new("linux", "x86_64"))
    }

    fn write_project(root: &Path) {
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(
            root.join("pyproject.toml"),
            "[project]\nname = \"my-ext\"\nversion = \"1.2.0\"\n",
        )
        .unwrap();
        std::fs::write(root.join("src/lib.zig"), "export fn one() i32 { return 1; }\n").unwrap();
    }

    #[test]
    fn test_wheel_tag_for_linux_host() {
        let tmp = TempDir::new().unwrap();
        let tag = backend(tmp.path()).wheel_tag().unwrap();
        assert_eq!(tag.platform, "manylinux2014_x86_64");
        assert_eq!(tag.to_string(), "cp312-cp312-manylinux2014_x86_64");
    }

    #[test]
    fn test_requirements_are_empty() {
        let tmp = TempDir::new().unwrap();
        let b = backend(tmp.path());
        assert!(b.get_requires_for_build_wheel().is_empty());
        assert!(b.get_requires_for_build_sdist().is_empty());
        assert!(b.get_requires_for_build_editable().is_empty());
    }

    #[test]
    fn test_missing_manifest_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = backend(tmp.path())
            .build_sdist(&tmp.path().join("dist"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_overrides_reach_compiler() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path());
        let name = backend(tmp.path())
            .with_release(Some(false))
            .with_strip(Some(false))
            .build_wheel_with(&tmp.path().join("dist"), &FakeCompiler)
            .unwrap();
        assert_eq!(name, "my_ext-1.2.0-cp312-cp312-manylinux2014_x86_64.whl");
    }

    #[test]
    fn test_prepare_metadata_hooks() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path());
        let b = backend(tmp.path());
        let meta = tmp.path().join("meta");
        assert_eq!(
            b.prepare_metadata_for_build_wheel(&meta).unwrap(),
            "my_ext-1.2.0.dist-info"
        );
        assert_eq!(
            b.prepare_metadata_for_build_editable(&meta).unwrap(),
            "my_ext-1.2.0.dist-info"
        );
    }

    #[test]
    fn test_exports() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path());
        let exports = backend(tmp.path()).exports().unwrap();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].name, "one");
    }
}

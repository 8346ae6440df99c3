//! The Zig compiler driver.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::error::BuildError;
use crate::core::tags::HostPlatform;
use crate::util::fs::ensure_dir;

use super::{find_zig, CommandSpec, CompileInput, NativeCompiler};

/// Main file names tried in order before falling back to any `.zig` file.
const MAIN_FILE_NAMES: &[&str] = &["lib.zig", "main.zig"];

/// Builds shared libraries with `zig build-lib`.
#[derive(Debug, Clone)]
pub struct ZigCompiler {
    zig: PathBuf,
}

impl ZigCompiler {
    /// Use a specific `zig` executable.
    pub fn new(zig: impl Into<PathBuf>) -> Self {
        ZigCompiler { zig: zig.into() }
    }

    /// Locate `zig` on this machine.
    pub fn detect() -> Result<Self> {
        Ok(ZigCompiler::new(find_zig()?))
    }

    pub fn path(&self) -> &Path {
        &self.zig
    }

    /// The `build-lib` command for `main_file`.
    pub fn build_command(&self, input: &CompileInput, main_file: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.zig)
            .arg("build-lib")
            .arg(main_file.display().to_string())
            .arg("-dynamic")
            .arg(format!("-femit-bin={}", input.output.display()))
            .arg("-fno-emit-h")
            .arg(format!("-O{}", input.optimize.as_str()));

        if input.strip {
            cmd = cmd.arg("-fstrip");
        }

        cmd.args(["-target".to_string(), zig_target(&input.host)])
            .cwd(&input.project_root)
    }
}

impl NativeCompiler for ZigCompiler {
    fn describe(&self) -> String {
        self.zig.display().to_string()
    }

    fn compile(&self, input: &CompileInput) -> Result<()> {
        let main_file = resolve_main_file(&input.src_dir, &input.module_name)?;

        if let Some(parent) = input.output.parent() {
            ensure_dir(parent)?;
        }

        let cmd = self.build_command(input, &main_file).into_process();

        tracing::info!(
            "Compiling {} -> {}",
            main_file.display(),
            input.output.display()
        );
        tracing::debug!("Running: {}", cmd.display_command());

        let output = cmd
            .exec()
            .with_context(|| format!("failed to run Zig compiler `{}`", self.zig.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostics = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).into_owned()
            } else {
                stderr.into_owned()
            };
            return Err(BuildError::CompilationFailed {
                code: output.status.code(),
                output: diagnostics,
            }
            .into());
        }

        if !input.output.is_file() {
            return Err(BuildError::MissingArtifact {
                path: input.output.clone(),
            }
            .into());
        }

        Ok(())
    }
}

/// Pick the compilation root in `src_dir`.
///
/// Tries `lib.zig`, `main.zig` and `{module}.zig`, then the first `.zig`
/// file directly in `src_dir` by name.
pub fn resolve_main_file(src_dir: &Path, module_name: &str) -> Result<PathBuf> {
    let module_file = format!("{}.zig", module_name);
    let named = MAIN_FILE_NAMES
        .iter()
        .copied()
        .chain(std::iter::once(module_file.as_str()))
        .map(|name| src_dir.join(name))
        .find(|candidate| candidate.is_file());

    if let Some(main) = named {
        return Ok(main);
    }

    let mut zig_files: Vec<PathBuf> = match std::fs::read_dir(src_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "zig"))
            .collect(),
        Err(e) => {
            tracing::debug!("cannot read {}: {}", src_dir.display(), e);
            Vec::new()
        }
    };
    zig_files.sort();

    zig_files.into_iter().next().ok_or_else(|| {
        BuildError::NoSources {
            dir: src_dir.to_path_buf(),
        }
        .into()
    })
}

/// Zig target triple for a host.
pub fn zig_target(host: &HostPlatform) -> String {
    let arch = match host.machine.as_str() {
        "x86_64" | "amd64" => "x86_64",
        "arm64" | "aarch64" => "aarch64",
        "i386" | "i686" | "x86" => "x86",
        other => other,
    };

    match host.os.as_str() {
        "windows" => format!("{}-windows-gnu", arch),
        "darwin" => format!("{}-macos", arch),
        "linux" => format!("{}-linux-gnu", arch),
        os => format!("{}-{}-gnu", arch, os),
    }
}

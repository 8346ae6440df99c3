//! Native compiler abstraction.
//!
//! The package assembler only needs "turn this source tree into a shared
//! library at this path". That contract is the [`NativeCompiler`] trait;
//! [`ZigCompiler`] is the real implementation.
//!
//! Compiler detection priority:
//! 1. The `ZIG` environment variable
//! 2. `zig` on PATH
//! 3. Well-known install locations

use std::path::PathBuf;

use anyhow::Result;

use crate::core::tags::HostPlatform;
use crate::util::process::ProcessBuilder;

mod detect;
mod zig;

pub use detect::{find_zig, well_known_locations, ZIG_ENV};
pub use zig::{resolve_main_file, zig_target, ZigCompiler};

/// A command to execute, with program, arguments and working directory.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to run
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Run from `dir`.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Convert into a runnable process.
    pub fn into_process(self) -> ProcessBuilder {
        let cmd = ProcessBuilder::new(&self.program).args(&self.args);

        match self.cwd {
            Some(cwd) => cmd.cwd(cwd),
            None => cmd,
        }
    }
}

/// Optimization level of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizeMode {
    #[default]
    ReleaseFast,
    Debug,
}

impl OptimizeMode {
    pub fn from_release(release: bool) -> Self {
        if release {
            OptimizeMode::ReleaseFast
        } else {
            OptimizeMode::Debug
        }
    }

    /// The `-O` flag value.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizeMode::ReleaseFast => "ReleaseFast",
            OptimizeMode::Debug => "Debug",
        }
    }
}

/// Input for building one shared library.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Project root; the compiler runs from here
    pub project_root: PathBuf,
    /// Zig source directory
    pub src_dir: PathBuf,
    /// Python module name, used to pick the main file
    pub module_name: String,
    /// Path of the shared library to produce
    pub output: PathBuf,
    /// Optimization level
    pub optimize: OptimizeMode,
    /// Strip debug information
    pub strip: bool,
    /// Host the library is built for
    pub host: HostPlatform,
}

/// Something that can turn a Zig source tree into a shared library.
pub trait NativeCompiler: Send + Sync {
    /// Short description for logs, e.g. the compiler path.
    fn describe(&self) -> String;

    /// Build `input.output`. On success the file exists.
    fn compile(&self, input: &CompileInput) -> Result<()>;
}

/// Shared library file extension for a host, without the dot.
pub fn lib_extension(host: &HostPlatform) -> &'static str {
    if host.is_windows() {
        "dll"
    } else if host.is_darwin() {
        "dylib"
    } else {
        "so"
    }
}

/// `lib{module}.{ext}`
pub fn lib_filename(module_name: &str, host: &HostPlatform) -> String {
    format!("lib{}.{}", module_name, lib_extension(host))
}

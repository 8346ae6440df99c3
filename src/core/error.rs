//! Fatal build errors.
//!
//! Every variant aborts the current build hook. They are raised through
//! `anyhow` so callers can `downcast_ref::<BuildError>()` when they need to
//! tell the categories apart.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The project has no `pyproject.toml`.
    #[error("pyproject.toml not found in {}", dir.display())]
    ConfigNotFound { dir: PathBuf },

    /// `pyproject.toml` exists but could not be read or parsed.
    #[error("failed to load {}: {message}", path.display())]
    ConfigInvalid { path: PathBuf, message: String },

    /// No Zig compiler on PATH or in any well-known location.
    #[error(
        "could not find the Zig compiler\n\
         \n\
         help: Install Zig and make sure `zig` is on your PATH, or set the ZIG\n\
         environment variable to the compiler executable.\n\
         See https://ziglang.org/download/ for installation instructions."
    )]
    ToolchainNotFound,

    /// The source directory holds no `.zig` files.
    #[error("no Zig source files found in {}", dir.display())]
    NoSources { dir: PathBuf },

    /// The compiler exited with a non-zero status.
    #[error("Zig compilation failed (exit code {code:?}):\n{output}")]
    CompilationFailed { code: Option<i32>, output: String },

    /// The compiler reported success but produced nothing.
    #[error("compilation completed but output file not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// No Python interpreter could be found to compute the wheel tag.
    #[error(
        "could not find a Python interpreter\n\
         \n\
         help: Pass --python <PATH>, set ZIGWHEEL_PYTHON, or pass\n\
         --interpreter <impl-X.Y> (for example `cpython-3.12`)."
    )]
    InterpreterNotFound,

    /// The interpreter ran but its answer could not be understood.
    #[error("failed to query interpreter `{}`: {message}", path.display())]
    InterpreterProbe { path: PathBuf, message: String },
}

//! Zig compiler discovery.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::error::BuildError;
use crate::core::tags::HostPlatform;
use crate::util::process::find_executable;

/// Environment variable that names the compiler explicitly.
pub const ZIG_ENV: &str = "ZIG";

/// Locate the `zig` executable.
///
/// Tries `$ZIG`, then PATH, then [`well_known_locations`].
pub fn find_zig() -> Result<PathBuf> {
    if let Some(zig) = std::env::var_os(ZIG_ENV).map(PathBuf::from) {
        if zig.is_file() {
            tracing::debug!("Using Zig from ${}: {}", ZIG_ENV, zig.display());
            return Ok(zig);
        }
        tracing::warn!(
            "${} points to {}, which does not exist; searching elsewhere",
            ZIG_ENV,
            zig.display()
        );
    }

    if let Some(zig) = find_executable("zig") {
        tracing::debug!("Found Zig on PATH: {}", zig.display());
        return Ok(zig);
    }

    for candidate in well_known_locations(&HostPlatform::current()) {
        if candidate.is_file() {
            tracing::debug!("Found Zig at {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(BuildError::ToolchainNotFound.into())
}

/// Install locations checked when `zig` is not on PATH.
pub fn well_known_locations(host: &HostPlatform) -> Vec<PathBuf> {
    let home = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf());
    let mut paths = Vec::new();

    if host.is_windows() {
        for var in ["LOCALAPPDATA", "PROGRAMFILES"] {
            if let Some(dir) = std::env::var_os(var) {
                paths.push(PathBuf::from(dir).join("zig").join("zig.exe"));
            }
        }
        if let Some(home) = home {
            paths.push(home.join(".zig").join("zig.exe"));
        }
    } else {
        if let Some(ref home) = home {
            paths.push(home.join(".local").join("bin").join("zig"));
        }
        paths.push(PathBuf::from("/usr/local/bin/zig"));
        paths.push(PathBuf::from("/usr/bin/zig"));
        if let Some(home) = home {
            paths.push(home.join(".zig").join("zig"));
        }
    }

    paths
}

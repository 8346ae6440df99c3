//! Wheel compatibility tags.
//!
//! A wheel is tagged `{interpreter}-{abi}-{platform}`. The interpreter and
//! ABI tags come from the Python that will import the package; the platform
//! tag comes from the host OS and machine. Tags are recomputed for every
//! build.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::core::error::BuildError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Environment variable naming the Python interpreter to tag for.
pub const PYTHON_ENV: &str = "ZIGWHEEL_PYTHON";

/// Operating system and machine architecture of the build host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    /// Lower-case OS family: `linux`, `darwin`, `windows`, ...
    pub os: String,
    /// Lower-case machine name: `x86_64`, `aarch64`, `arm64`, ...
    pub machine: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, machine: impl Into<String>) -> Self {
        HostPlatform {
            os: os.into().to_lowercase(),
            machine: machine.into().to_lowercase(),
        }
    }

    /// The platform this process is running on.
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        HostPlatform::new(os, std::env::consts::ARCH)
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn is_darwin(&self) -> bool {
        self.os == "darwin"
    }

    /// Platform tag for wheels built on this host.
    pub fn platform_tag(&self) -> String {
        let machine = self.machine.as_str();
        let tag = match self.os.as_str() {
            "windows" => match machine {
                "amd64" | "x86_64" => "win_amd64".to_string(),
                "arm64" | "aarch64" => "win_arm64".to_string(),
                _ => "win32".to_string(),
            },
            "darwin" => match machine {
                "arm64" | "aarch64" => "macosx_11_0_arm64".to_string(),
                "x86_64" => "macosx_10_9_x86_64".to_string(),
                other => format!("macosx_10_9_{}", other),
            },
            // manylinux2014 for broad compatibility
            "linux" => match machine {
                "x86_64" => "manylinux2014_x86_64".to_string(),
                "aarch64" => "manylinux2014_aarch64".to_string(),
                other => format!("linux_{}", other),
            },
            os => format!("{}_{}", os, machine),
        };
        sanitize_tag(&tag)
    }
}

/// A Python implementation and language version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// `sys.implementation.name`, e.g. `cpython` or `pypy`.
    pub implementation: String,
    pub major: u32,
    pub minor: u32,
}

impl Interpreter {
    pub fn new(implementation: impl Into<String>, major: u32, minor: u32) -> Self {
        Interpreter {
            implementation: implementation.into().to_lowercase(),
            major,
            minor,
        }
    }

    /// Find and query a Python interpreter.
    ///
    /// Looks at `explicit`, then `$ZIGWHEEL_PYTHON`, then `python3` and
    /// `python` on PATH.
    pub fn detect(explicit: Option<&Path>) -> Result<Self> {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(PYTHON_ENV).map(PathBuf::from))
            .or_else(|| find_executable("python3"))
            .or_else(|| find_executable("python"));

        let Some(python) = candidate else {
            return Err(BuildError::InterpreterNotFound.into());
        };

        Self::probe(&python)
    }

    /// Ask a specific interpreter for its implementation and version.
    pub fn probe(python: &Path) -> Result<Self> {
        tracing::debug!("Probing interpreter {}", python.display());

        let output = ProcessBuilder::new(python)
            .args([
                "-c",
                "import sys; print(sys.implementation.name, *sys.version_info[:2])",
            ])
            .exec()
            .map_err(|e| BuildError::InterpreterProbe {
                path: python.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        if !output.status.success() {
            return Err(BuildError::InterpreterProbe {
                path: python.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe(&stdout).ok_or_else(|| {
            BuildError::InterpreterProbe {
                path: python.to_path_buf(),
                message: format!("unexpected output: {}", stdout.trim()),
            }
            .into()
        })
    }

    /// Parse `"<impl> <major> <minor>"`.
    fn parse_probe(output: &str) -> Option<Self> {
        let mut parts = output.split_whitespace();
        let implementation = parts.next()?;
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some(Interpreter::new(implementation, major, minor))
    }

    /// Two-letter implementation prefix plus version digits, e.g. `cp312`.
    pub fn interpreter_tag(&self) -> String {
        let prefix: String = match self.implementation.as_str() {
            "cpython" => "cp".to_string(),
            "pypy" => "pp".to_string(),
            other => other.chars().take(2).collect(),
        };
        sanitize_tag(&format!("{}{}{}", prefix, self.major, self.minor))
    }

    /// ABI tag. Matches the interpreter tag for Python 3.8+.
    pub fn abi_tag(&self) -> String {
        self.interpreter_tag()
    }
}

impl FromStr for Interpreter {
    type Err = anyhow::Error;

    /// Parse `cpython-3.12` or `pypy-3.10`.
    fn from_str(s: &str) -> Result<Self> {
        let Some((implementation, version)) = s.split_once('-') else {
            bail!("invalid interpreter `{}`: expected <impl>-<major>.<minor>", s);
        };
        let Some((major, minor)) = version.split_once('.') else {
            bail!("invalid interpreter version `{}`: expected <major>.<minor>", version);
        };
        let major: u32 = major
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid major version `{}`", major))?;
        let minor: u32 = minor
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid minor version `{}`", minor))?;
        if implementation.is_empty() {
            bail!("invalid interpreter `{}`: missing implementation name", s);
        }
        Ok(Interpreter::new(implementation, major, minor))
    }
}

/// The `{interpreter}-{abi}-{platform}` triple of a wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTag {
    pub interpreter: String,
    pub abi: String,
    pub platform: String,
}

impl WheelTag {
    /// Compute the tag for an interpreter on a host.
    pub fn compute(interpreter: &Interpreter, host: &HostPlatform) -> Self {
        WheelTag {
            interpreter: interpreter.interpreter_tag(),
            abi: interpreter.abi_tag(),
            platform: host.platform_tag(),
        }
    }
}

impl fmt::Display for WheelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// Replace anything outside `[A-Za-z0-9_]` with `_`.
fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_platform_tags() {
        assert_eq!(
            HostPlatform::new("Linux", "x86_64").platform_tag(),
            "manylinux2014_x86_64"
        );
        assert_eq!(
            HostPlatform::new("linux", "aarch64").platform_tag(),
            "manylinux2014_aarch64"
        );
        assert_eq!(
            HostPlatform::new("linux", "riscv64").platform_tag(),
            "linux_riscv64"
        );
    }

    #[test]
    fn test_darwin_platform_tags() {
        assert_eq!(
            HostPlatform::new("darwin", "arm64").platform_tag(),
            "macosx_11_0_arm64"
        );
        assert_eq!(
            HostPlatform::new("darwin", "aarch64").platform_tag(),
            "macosx_11_0_arm64"
        );
        assert_eq!(
            HostPlatform::new("darwin", "x86_64").platform_tag(),
            "macosx_10_9_x86_64"
        );
    }

    #[test]
    fn test_windows_platform_tags() {
        assert_eq!(HostPlatform::new("windows", "AMD64").platform_tag(), "win_amd64");
        assert_eq!(HostPlatform::new("windows", "arm64").platform_tag(), "win_arm64");
        assert_eq!(HostPlatform::new("windows", "x86").platform_tag(), "win32");
    }

    #[test]
    fn test_unknown_platform_is_sanitized() {
        assert_eq!(
            HostPlatform::new("freebsd", "x86_64").platform_tag(),
            "freebsd_x86_64"
        );
        let tag = HostPlatform::new("weird/os", "a-b.c").platform_tag();
        assert_eq!(tag, "weird_os_a_b_c");
        assert!(!tag.contains('/') && !tag.contains('-') && !tag.contains('.'));
    }

    #[test]
    fn test_interpreter_tags() {
        assert_eq!(Interpreter::new("cpython", 3, 12).interpreter_tag(), "cp312");
        assert_eq!(Interpreter::new("pypy", 3, 10).interpreter_tag(), "pp310");
        assert_eq!(Interpreter::new("graalpy", 3, 11).interpreter_tag(), "gr311");
        assert_eq!(Interpreter::new("cpython", 3, 12).abi_tag(), "cp312");
    }

    #[test]
    fn test_interpreter_from_str() {
        let interp: Interpreter = "cpython-3.12".parse().unwrap();
        assert_eq!(interp, Interpreter::new("cpython", 3, 12));
        assert!("cpython".parse::<Interpreter>().is_err());
        assert!("cpython-3".parse::<Interpreter>().is_err());
        assert!("-3.12".parse::<Interpreter>().is_err());
    }

    #[test]
    fn test_parse_probe_output() {
        let interp = Interpreter::parse_probe("cpython 3 11\n").unwrap();
        assert_eq!(interp, Interpreter::new("cpython", 3, 11));
        assert!(Interpreter::parse_probe("garbage").is_none());
    }

    #[test]
    fn test_wheel_tag_display() {
        let tag = WheelTag::compute(
            &Interpreter::new("cpython", 3, 12),
            &HostPlatform::new("linux", "x86_64"),
        );
        assert_eq!(tag.to_string(), "cp312-cp312-manylinux2014_x86_64");
    }
}

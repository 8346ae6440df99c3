//! Core data structures for zigwheel.
//!
//! This module contains the foundational types used throughout zigwheel:
//! - The project manifest (`pyproject.toml`)
//! - Wheel compatibility tags and the host they are computed for
//! - The fatal build error taxonomy

pub mod error;
pub mod manifest;
pub mod tags;

pub use error::BuildError;
pub use manifest::{BuildConfig, PackageMetadata, ProjectManifest, MANIFEST_NAME};
pub use tags::{HostPlatform, Interpreter, WheelTag};

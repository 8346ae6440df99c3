//! zigwheel - A Python build backend for Zig extension modules
//!
//! This crate provides the core library functionality for zigwheel:
//! scanning Zig sources for exported functions, generating a ctypes loader
//! module, compiling the shared library and packaging wheels and sdists.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use crate::core::{
    error::BuildError, manifest::ProjectManifest, tags::HostPlatform, tags::Interpreter,
    tags::WheelTag,
};

pub use ops::Backend;

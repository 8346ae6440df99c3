//! Native build system.
//!
//! This module drives the Zig compiler and generates the Python bindings
//! for the library it produces.

pub mod bindings;
pub mod toolchain;

pub use bindings::{ExportScanner, ExportedFunction, PythonGenerator, TypeDescriptor};
pub use toolchain::{CommandSpec, CompileInput, NativeCompiler, OptimizeMode, ZigCompiler};

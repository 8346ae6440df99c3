//! Python binding generation for Zig libraries.
//!
//! This module scans Zig sources for exported functions and generates the
//! ctypes loader module that exposes them to Python.

pub mod parser;
pub mod python;
pub mod types;

pub use parser::ExportScanner;
pub use python::PythonGenerator;
pub use types::{ExportParam, ExportedFunction, TypeDescriptor};

//! High-level operations.
//!
//! This module contains the build hooks and the packaging steps behind them.

pub mod backend;
pub mod metadata;
pub mod record;
pub mod sdist;
pub mod wheel;

pub use backend::{Backend, BuildKind};
pub use metadata::{prepare_metadata, render_metadata, render_wheel};
pub use record::{render_record, write_record, RecordEntry};
pub use sdist::build_sdist;
pub use wheel::{build_editable, build_wheel, wheel_file_name, WheelOptions};

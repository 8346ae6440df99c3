//! Command implementations

pub mod build;
pub mod completions;
pub mod exports;
pub mod metadata;
pub mod requires;
pub mod tag;

use zigwheel::Backend;

use crate::cli::Cli;

/// Backend for the project and interpreter selected on the command line.
pub fn backend(cli: &Cli) -> Backend {
    Backend::new(&cli.project)
        .with_interpreter(cli.interpreter.clone())
        .with_python(cli.python.clone())
}

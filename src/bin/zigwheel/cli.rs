//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use zigwheel::Interpreter;

/// zigwheel - Build Python wheels from Zig sources
#[derive(Parser)]
#[command(name = "zigwheel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory containing pyproject.toml
    #[arg(long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Tag wheels for this interpreter instead of probing one (e.g. cpython-3.12)
    #[arg(long, global = true, value_name = "IMPL-X.Y")]
    pub interpreter: Option<Interpreter>,

    /// Python executable to probe for the wheel tag
    #[arg(long, global = true, value_name = "PATH")]
    pub python: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a wheel
    Wheel(WheelArgs),

    /// Build a source distribution
    Sdist(OutDirArgs),

    /// Build an editable wheel that loads the package from the project
    Develop(OutDirArgs),

    /// Write the .dist-info metadata directory
    Metadata(MetadataArgs),

    /// Print extra build requirements as JSON
    Requires(RequiresArgs),

    /// List the exported functions found in the Zig sources
    Exports(ExportsArgs),

    /// Print the wheel tag for this host
    Tag,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct OutDirArgs {
    /// Output directory
    #[arg(short, long, default_value = "dist")]
    pub out_dir: PathBuf,
}

#[derive(Args)]
pub struct WheelArgs {
    #[command(flatten)]
    pub out: OutDirArgs,

    /// Build with -ODebug instead of -OReleaseFast
    #[arg(long)]
    pub debug: bool,

    /// Keep debug symbols in the library
    #[arg(long)]
    pub no_strip: bool,
}

#[derive(Args)]
pub struct MetadataArgs {
    /// Directory to write the .dist-info directory into
    pub metadata_dir: PathBuf,

    /// Prepare metadata for an editable build
    #[arg(long)]
    pub editable: bool,
}

#[derive(Args)]
pub struct RequiresArgs {
    /// Build the requirements are for
    #[arg(value_enum, default_value = "wheel")]
    pub kind: RequiresKind,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RequiresKind {
    Wheel,
    Sdist,
    Editable,
}

#[derive(Args)]
pub struct ExportsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

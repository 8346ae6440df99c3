//! zigwheel CLI - Build Python wheels from Zig sources

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("zigwheel=debug")
    } else {
        EnvFilter::new("zigwheel=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let backend = commands::backend(&cli);

    // Execute command
    match cli.command {
        Commands::Wheel(args) => commands::build::wheel(&backend, args),
        Commands::Sdist(args) => commands::build::sdist(&backend, args),
        Commands::Develop(args) => commands::build::develop(&backend, args),
        Commands::Metadata(args) => commands::metadata::execute(&backend, args),
        Commands::Requires(args) => commands::requires::execute(&backend, args),
        Commands::Exports(args) => commands::exports::execute(&backend, args),
        Commands::Tag => commands::tag::execute(&backend),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

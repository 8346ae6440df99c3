//! `zigwheel metadata` command

use anyhow::Result;

use crate::cli::MetadataArgs;
use zigwheel::Backend;

pub fn execute(backend: &Backend, args: MetadataArgs) -> Result<()> {
    let name = if args.editable {
        backend.prepare_metadata_for_build_editable(&args.metadata_dir)?
    } else {
        backend.prepare_metadata_for_build_wheel(&args.metadata_dir)?
    };
    println!("{}", name);
    Ok(())
}

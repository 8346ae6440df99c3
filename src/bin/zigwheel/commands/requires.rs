//! `zigwheel requires` command

use anyhow::Result;

use crate::cli::{RequiresArgs, RequiresKind};
use zigwheel::Backend;

pub fn execute(backend: &Backend, args: RequiresArgs) -> Result<()> {
    let requires = match args.kind {
        RequiresKind::Wheel => backend.get_requires_for_build_wheel(),
        RequiresKind::Sdist => backend.get_requires_for_build_sdist(),
        RequiresKind::Editable => backend.get_requires_for_build_editable(),
    };
    println!("{}", serde_json::to_string(&requires)?);
    Ok(())
}

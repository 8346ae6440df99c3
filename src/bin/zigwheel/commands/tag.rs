//! `zigwheel tag` command

use anyhow::Result;

use zigwheel::Backend;

pub fn execute(backend: &Backend) -> Result<()> {
    println!("{}", backend.wheel_tag()?);
    Ok(())
}

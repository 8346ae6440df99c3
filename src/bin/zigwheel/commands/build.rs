//! `zigwheel wheel`, `zigwheel sdist` and `zigwheel develop` commands
//!
//! Each prints the name of the file it wrote.

use anyhow::Result;

use crate::cli::{OutDirArgs, WheelArgs};
use zigwheel::Backend;

pub fn wheel(backend: &Backend, args: WheelArgs) -> Result<()> {
    let backend = backend
        .clone()
        .with_release(args.debug.then_some(false))
        .with_strip(args.no_strip.then_some(false));

    let name = backend.build_wheel(&args.out.out_dir)?;
    println!("{}", name);
    Ok(())
}

pub fn sdist(backend: &Backend, args: OutDirArgs) -> Result<()> {
    let name = backend.build_sdist(&args.out_dir)?;
    println!("{}", name);
    Ok(())
}

pub fn develop(backend: &Backend, args: OutDirArgs) -> Result<()> {
    let name = backend.build_editable(&args.out_dir)?;
    println!("{}", name);
    Ok(())
}

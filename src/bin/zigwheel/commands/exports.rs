//! `zigwheel exports` command
//!
//! Shows what the generated module will expose, with the ctypes each
//! parameter and return value is marshaled as.

use anyhow::Result;

use crate::cli::ExportsArgs;
use zigwheel::builder::bindings::{ExportedFunction, TypeDescriptor};
use zigwheel::Backend;

pub fn execute(backend: &Backend, args: ExportsArgs) -> Result<()> {
    let functions = backend.exports()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&functions)?);
        return Ok(());
    }

    if functions.is_empty() {
        println!("No exported functions found.");
        return Ok(());
    }

    for func in &functions {
        println!("{}", signature(func));
        for line in func.doc.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}

fn signature(func: &ExportedFunction) -> String {
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, TypeDescriptor::map(&p.ty).as_ctypes()))
        .collect();
    format!(
        "{}({}) -> {}",
        func.name,
        params.join(", "),
        TypeDescriptor::map(&func.return_type).as_ctypes()
    )
}

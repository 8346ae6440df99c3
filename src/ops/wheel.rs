//! Wheel assembly.
//!
//! Files are staged in a temporary directory that is removed on every exit
//! path, then hashed into RECORD and zipped. Archive members are written
//! payload first, `.dist-info` last and RECORD final.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::builder::bindings::{ExportScanner, PythonGenerator};
use crate::builder::toolchain::{lib_filename, CompileInput, NativeCompiler, OptimizeMode};
use crate::core::manifest::ProjectManifest;
use crate::core::tags::{HostPlatform, WheelTag};
use crate::ops::metadata::write_metadata_files;
use crate::ops::record::write_record;
use crate::util::fs::{archive_name, ensure_dir, persist, temp_file_for, walk_files, write_string};

/// Options for building a wheel.
#[derive(Debug, Clone)]
pub struct WheelOptions {
    /// Directory the `.whl` is written to
    pub output_dir: PathBuf,
    /// Tag written into WHEEL and the file name
    pub tag: WheelTag,
    /// Host the library is compiled for
    pub host: HostPlatform,
}

impl WheelOptions {
    pub fn new(output_dir: impl Into<PathBuf>, tag: WheelTag, host: HostPlatform) -> Self {
        WheelOptions {
            output_dir: output_dir.into(),
            tag,
            host,
        }
    }
}

/// `{name}-{version}-{tag}.whl`
pub fn wheel_file_name(project: &ProjectManifest, tag: &WheelTag) -> String {
    format!(
        "{}-{}-{}.whl",
        project.metadata.escaped_name(),
        project.metadata.escaped_version(),
        tag
    )
}

/// Compile, generate bindings and package a regular wheel.
///
/// Returns the file name of the wheel written into `opts.output_dir`.
pub fn build_wheel(
    project: &ProjectManifest,
    opts: &WheelOptions,
    compiler: &dyn NativeCompiler,
) -> Result<String> {
    let staging = staging_dir()?;
    let module = &project.build.module_name;
    let src_dir = project.src_dir();
    let pkg_dir = staging.path().join(module);
    ensure_dir(&pkg_dir)?;

    let lib_name = lib_filename(module, &opts.host);
    let input = CompileInput {
        project_root: project.root.clone(),
        src_dir: src_dir.clone(),
        module_name: module.clone(),
        output: pkg_dir.join(&lib_name),
        optimize: OptimizeMode::from_release(project.build.release),
        strip: project.build.strip,
        host: opts.host.clone(),
    };
    tracing::debug!("Compiling with {}", compiler.describe());
    compiler.compile(&input)?;

    let functions = ExportScanner::new().scan_dir(&src_dir);
    let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
    tracing::info!(
        "Detected {} exported functions: {:?}",
        functions.len(),
        names
    );

    let init = PythonGenerator::new(module.as_str(), lib_name)
        .with_lock_release(project.build.lock_release)
        .with_version(project.metadata.version.as_str())
        .generate(&functions);
    write_string(&pkg_dir.join("__init__.py"), &init)?;
    write_string(&pkg_dir.join("py.typed"), "")?;

    finish_wheel(staging.path(), project, opts)
}

/// Package an editable wheel that points the interpreter at the project.
///
/// Nothing is compiled or scanned.
pub fn build_editable(project: &ProjectManifest, opts: &WheelOptions) -> Result<String> {
    let staging = staging_dir()?;
    let root = std::fs::canonicalize(&project.root).with_context(|| {
        format!("failed to resolve project root: {}", project.root.display())
    })?;

    let pth = staging
        .path()
        .join(format!("{}.pth", project.build.module_name));
    write_string(&pth, &format!("{}\n", root.display()))?;

    finish_wheel(staging.path(), project, opts)
}

fn staging_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("zigwheel-")
        .tempdir()
        .context("failed to create staging directory")
}

/// Write `.dist-info`, RECORD and the archive for a staged payload.
fn finish_wheel(staging: &Path, project: &ProjectManifest, opts: &WheelOptions) -> Result<String> {
    let dist_info = project.metadata.dist_info_name();
    let dist_info_dir = staging.join(&dist_info);

    write_metadata_files(&dist_info_dir, project, &opts.tag)?;
    write_string(
        &dist_info_dir.join("top_level.txt"),
        &format!("{}\n", project.build.module_name),
    )?;
    let record = write_record(staging, &dist_info)?;

    let file_name = wheel_file_name(project, &opts.tag);
    ensure_dir(&opts.output_dir)?;
    let wheel_path = opts.output_dir.join(&file_name);
    write_archive(staging, &dist_info, &record, &wheel_path)?;

    tracing::info!("Built {}", wheel_path.display());
    Ok(file_name)
}

fn write_archive(staging: &Path, dist_info: &str, record: &Path, dest: &Path) -> Result<()> {
    let mut payload = Vec::new();
    let mut metadata = Vec::new();
    let dist_info_prefix = format!("{}/", dist_info);

    for file in walk_files(staging)? {
        if file == record {
            continue;
        }
        let name = archive_name(staging, &file)?;
        if name.starts_with(&dist_info_prefix) {
            metadata.push((name, file));
        } else {
            payload.push((name, file));
        }
    }
    payload.sort();
    metadata.sort();
    metadata.push((archive_name(staging, record)?, record.to_path_buf()));

    let mut zip = ZipWriter::new(temp_file_for(dest)?);

    for (name, path) in payload.iter().chain(metadata.iter()) {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(permissions_for(name));

        zip.start_file(name.as_str(), options)
            .with_context(|| format!("failed to add {} to wheel", name))?;
        let mut src = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        io::copy(&mut src, &mut zip)
            .with_context(|| format!("failed to write {} to wheel", name))?;
    }

    let mut out = zip.finish().context("failed to finish wheel archive")?;
    out.flush()
        .with_context(|| format!("failed to write wheel: {}", dest.display()))?;
    persist(out, dest)
}

fn permissions_for(name: &str) -> u32 {
    let is_library = [".so", ".dylib", ".dll"]
        .iter()
        .any(|ext| name.ends_with(ext));
    if is_library {
        0o755
    } else {
        0o644
    }
}

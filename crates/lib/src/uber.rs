//! Uber-archive linker.
//!
//! Older iOS linkers cannot reliably consume several fat archives whose objects
//! reference each other, so every library is merged at the object-file level:
//!
//! 1. Split: thin each device arch out of the staged device archive into
//!    `<build>/<arch>/`, and copy the simulator archive into `<build>/i386/`.
//! 2. Explode: `ar -x` each thin archive into `<build>/<arch>/obj/`. Objects of
//!    different libraries share one flat directory per arch; name collisions
//!    overwrite each other.
//! 3. Relink: `ar crus` each arch's objects into `<build>/<arch>/libboost.a`.
//! 4. Fuse: `lipo -create` the per-arch archives into `<build>/libboost.a`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::paths::{MissingArtifact, require};
use crate::platform::{Arch, Platform, TargetTriple};
use crate::tool::{Invocation, ToolError, ToolRunner};
use crate::util::fs::{remove_dir_if_exists, remove_file_if_exists};

#[derive(Debug, Error)]
pub enum UberError {
  #[error(transparent)]
  Missing(#[from] MissingArtifact),

  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error("i/o error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> UberError + '_ {
  move |source| UberError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Result of the uber-archive stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UberArchives {
  /// Consolidated archive of each architecture that had objects, in fusing order.
  pub consolidated: Vec<(Arch, PathBuf)>,
  /// The fused universal archive; `None` when no architecture had objects.
  pub universal: Option<PathBuf>,
}

/// Run every step of the stage.
pub async fn link_all<R: ToolRunner>(config: &Config, runner: &R) -> Result<UberArchives, UberError> {
  prepare_dirs(config)?;
  split(config, runner).await?;
  explode(config, runner).await?;

  let mut consolidated = Vec::new();
  for arch in Arch::ALL {
    if let Some(archive) = relink(config, runner, arch).await? {
      consolidated.push((arch, archive));
    }
  }

  let archives: Vec<PathBuf> = consolidated.iter().map(|(_, path)| path.clone()).collect();
  let universal = fuse(config, runner, &archives, &config.paths().universal_archive()).await?;

  Ok(UberArchives {
    consolidated,
    universal,
  })
}

/// Recreate an empty `obj/` directory for every architecture.
fn prepare_dirs(config: &Config) -> Result<(), UberError> {
  let paths = config.paths();
  for arch in Arch::ALL {
    let obj = paths.obj_dir(arch);
    remove_dir_if_exists(&obj).map_err(io_err(&obj))?;
    fs::create_dir_all(&obj).map_err(io_err(&obj))?;
  }
  Ok(())
}

/// Produce one thin archive per library and architecture.
pub async fn split<R: ToolRunner>(config: &Config, runner: &R) -> Result<(), UberError> {
  let paths = config.paths();
  let lipo = paths.tool(Platform::Device, "lipo");
  info!("splitting fat archives");

  for library in &config.libraries {
    let device = require(paths.staged_archive(library, Platform::Device))?;
    let simulator = require(paths.staged_archive(library, Platform::Simulator))?;

    for arch in Platform::Device.archs() {
      let thin = Invocation::new(&lipo)
        .arg(&device)
        .arg("-thin")
        .arg(arch.as_str())
        .arg("-output")
        .arg(paths.thin_archive(library, arch));
      runner.run(&thin).await?;
    }

    for arch in Platform::Simulator.archs() {
      let dest = paths.thin_archive(library, arch);
      fs::copy(&simulator, &dest).map_err(io_err(&dest))?;
    }
  }
  Ok(())
}

/// Extract every thin archive into its architecture's flat object directory.
pub async fn explode<R: ToolRunner>(config: &Config, runner: &R) -> Result<(), UberError> {
  let paths = config.paths();
  info!("decomposing archives");

  for library in &config.libraries {
    for target in TargetTriple::all() {
      debug!(library = %library, target = %target, "decomposing");
      let extract = Invocation::new(paths.tool(target.platform, "ar"))
        .current_dir(paths.obj_dir(target.arch))
        .arg("-x")
        .arg(Path::new("..").join(library.archive_file_name()));
      runner.run(&extract).await?;
    }
  }
  Ok(())
}

/// Object files of one architecture, sorted by name.
pub fn object_files(obj_dir: &Path) -> Result<Vec<String>, UberError> {
  let entries = fs::read_dir(obj_dir).map_err(io_err(obj_dir))?;
  let mut objects = Vec::new();
  for entry in entries {
    let entry = entry.map_err(io_err(obj_dir))?;
    let name = entry.file_name().to_string_lossy().into_owned();
    if name.ends_with(".o") {
      objects.push(name);
    }
  }
  objects.sort();
  Ok(objects)
}

/// Archive every object of `arch` into its consolidated archive.
///
/// `ar r` appends to an existing archive, so a consolidated archive left by
/// an earlier run is removed first. Returns `None` when there are no objects.
pub async fn relink<R: ToolRunner>(config: &Config, runner: &R, arch: Arch) -> Result<Option<PathBuf>, UberError> {
  let paths = config.paths();
  let archive = paths.consolidated_archive(arch);
  remove_file_if_exists(&archive).map_err(io_err(&archive))?;

  let objects = object_files(&paths.obj_dir(arch))?;
  if objects.is_empty() {
    warn!(arch = %arch, "no object files, skipping consolidated archive");
    return Ok(None);
  }
  info!(arch = %arch, objects = objects.len(), "linking uber archive");

  let relink = Invocation::new(paths.tool(arch.platform(), "ar"))
    .current_dir(paths.arch_dir(arch))
    .env("ZERO_AR_DATE", "1")
    .arg("crus")
    .arg(archive.file_name().unwrap_or_default())
    .args(objects.iter().map(|name| Path::new("obj").join(name)));
  runner.run(&relink).await?;

  Ok(Some(archive))
}

/// Fuse per-architecture archives into one universal archive at `output`.
///
/// Returns `None` without invoking `lipo` when there is nothing to fuse.
pub async fn fuse<R: ToolRunner>(
  config: &Config,
  runner: &R,
  archives: &[PathBuf],
  output: &Path,
) -> Result<Option<PathBuf>, UberError> {
  remove_file_if_exists(output).map_err(io_err(output))?;
  if archives.is_empty() {
    warn!("no consolidated archives to fuse");
    return Ok(None);
  }

  let fuse = Invocation::new(config.paths().tool(Platform::Device, "lipo"))
    .arg("-create")
    .args(archives)
    .arg("-output")
    .arg(output);
  runner.run(&fuse).await?;

  Ok(Some(output.to_path_buf()))
}

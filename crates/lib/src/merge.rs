//! Archive merger ("lipoficate").
//!
//! Fuses each library's device and simulator archives from b2's native output
//! tree into one universal archive in `<prefix>/lib`.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::paths::LocateError;
use crate::platform::Platform;
use crate::tool::{Invocation, ToolError, ToolRunner};
use crate::types::LibraryName;

#[derive(Debug, Error)]
pub enum MergeError {
  /// An input archive the build driver should have produced is absent.
  #[error("cannot merge '{library}': missing archive {}", path.display())]
  MissingArchive { library: LibraryName, path: PathBuf },

  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to create {}: {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Input archives of one library, one per platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInputs {
  pub library: LibraryName,
  pub device: PathBuf,
  pub simulator: PathBuf,
}

/// Locate both native archives of `library`.
pub fn locate_inputs(config: &Config, library: &LibraryName) -> Result<MergeInputs, MergeError> {
  let paths = config.paths();
  let find = |platform| {
    paths
      .native_archive(library, platform)
      .map_err(|err| match err {
        LocateError::Missing(missing) => MergeError::MissingArchive {
          library: library.clone(),
          path: missing.path,
        },
        LocateError::Io { path, source } => MergeError::Io { path, source },
      })
  };

  Ok(MergeInputs {
    library: library.clone(),
    device: find(Platform::Device)?,
    simulator: find(Platform::Simulator)?,
  })
}

/// Merge every configured library.
///
/// All inputs are located before the first `lipo` runs, so a missing archive
/// aborts the stage without writing any universal archive.
pub async fn merge_all<R: ToolRunner>(config: &Config, runner: &R) -> Result<Vec<PathBuf>, MergeError> {
  let inputs = config
    .libraries
    .iter()
    .map(|library| locate_inputs(config, library))
    .collect::<Result<Vec<_>, _>>()?;

  let lib_dir = config.paths().prefix_lib_dir();
  fs::create_dir_all(&lib_dir).map_err(|source| MergeError::CreateDir {
    path: lib_dir.clone(),
    source,
  })?;

  let mut merged = Vec::with_capacity(inputs.len());
  for input in &inputs {
    merged.push(lipoficate(config, runner, input).await?);
  }
  Ok(merged)
}

/// Fuse one library's platform archives into `<prefix>/lib/libboost_<name>.a`.
pub async fn lipoficate<R: ToolRunner>(config: &Config, runner: &R, inputs: &MergeInputs) -> Result<PathBuf, MergeError> {
  let paths = config.paths();
  let output = paths.merged_archive(&inputs.library);
  info!(library = %inputs.library, "lipoficating");

  let lipo = Invocation::new(paths.tool(Platform::Device, "lipo"))
    .arg("-create")
    .arg(&inputs.device)
    .arg(&inputs.simulator)
    .arg("-output")
    .arg(&output);
  runner.run(&lipo).await?;

  Ok(output)
}

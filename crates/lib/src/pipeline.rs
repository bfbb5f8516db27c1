//! End-to-end pipeline.
//!
//! Runs every stage strictly in sequence; each stage consumes the files the
//! previous one left on disk. The first failure aborts the run and leftovers
//! are removed by the next run's cleaning step.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::driver::{self, DriverError};
use crate::framework::{self, FrameworkError, VerifyError, verify_bundle};
use crate::headers::{self, HeaderError};
use crate::merge::{self, MergeError};
use crate::platform::Arch;
use crate::source::{self, SourceError};
use crate::tool::{ToolError, ToolRunner};
use crate::types::SourceInfo;
use crate::uber::{self, UberError};
use crate::util::fs::remove_dir_if_exists;
use crate::util::hash::ContentHash;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("failed to clean {}: {source}", path.display())]
  Clean {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Headers(#[from] HeaderError),

  #[error(transparent)]
  Driver(#[from] DriverError),

  #[error(transparent)]
  Merge(#[from] MergeError),

  #[error(transparent)]
  Uber(#[from] UberError),

  #[error(transparent)]
  Framework(#[from] FrameworkError),

  #[error(transparent)]
  Verify(#[from] VerifyError),
}

impl PipelineError {
  /// The external tool failure behind this error, if any.
  pub fn tool_error(&self) -> Option<&ToolError> {
    match self {
      Self::Source(SourceError::Tool(e))
      | Self::Driver(DriverError::Tool(e))
      | Self::Merge(MergeError::Tool(e))
      | Self::Uber(UberError::Tool(e)) => Some(e),
      _ => None,
    }
  }

  /// Exit code of the failed tool, if one failed with a code.
  pub fn exit_code(&self) -> Option<i32> {
    self.tool_error().and_then(ToolError::exit_code)
  }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub source: SourceInfo,
  pub patched_headers: Vec<PathBuf>,
  pub merged_archives: Vec<PathBuf>,
  pub consolidated_archives: Vec<(Arch, PathBuf)>,
  pub bundle: PathBuf,
  pub has_binary: bool,
  pub digest: ContentHash,
  pub elapsed: Duration,
}

/// Remove everything a previous run generated.
///
/// Returns the directories that existed and were removed.
pub fn clean(config: &Config) -> Result<Vec<PathBuf>, PipelineError> {
  let mut removed = Vec::new();
  for dir in config.paths().generated_dirs() {
    let existed = remove_dir_if_exists(&dir).map_err(|source| PipelineError::Clean {
      path: dir.clone(),
      source,
    })?;
    if existed {
      info!(path = %dir.display(), "removed");
      removed.push(dir);
    }
  }
  Ok(removed)
}

/// Run the whole pipeline.
pub async fn run<R: ToolRunner>(config: &Config, runner: &R) -> Result<RunReport, PipelineError> {
  let started = Instant::now();

  clean(config)?;
  let source = source::synchronize(config, runner).await?;
  let patched_headers = headers::patch_missing_headers(config)?;
  driver::build_all(config, runner).await?;
  let merged_archives = merge::merge_all(config, runner).await?;
  let archives = uber::link_all(config, runner).await?;
  let bundle = framework::package(config, &source.version, archives.universal.as_deref())?;
  let summary = verify_bundle(&bundle)?;

  let elapsed = started.elapsed();
  info!(bundle = %bundle.display(), digest = %summary.digest, ?elapsed, "framework complete");

  Ok(RunReport {
    source,
    patched_headers,
    merged_archives,
    consolidated_archives: archives.consolidated,
    bundle,
    has_binary: summary.has_binary,
    digest: summary.digest,
    elapsed,
  })
}

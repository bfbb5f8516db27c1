//! Source synchronization.
//!
//! Ensures `<src>/boost` is a git checkout of the newest upstream release and
//! registers the iOS toolsets with b2. All version-control work is delegated to
//! the `git` executable through a [`ToolRunner`].
//!
//! - Existing checkout: untracked files are removed, tags are fetched, and the
//!   newest release tag is checked out (submodules included).
//! - Missing checkout: the newest release tag is discovered on the remote and
//!   cloned shallowly.
//!
//! The toolset blocks are appended to `tools/build/src/user-config.jam` only when
//! git reports no pending change to that file, so repeated runs never stack
//! duplicate blocks.

pub mod jam;
pub mod tags;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::consts::RELEASE_TAG_PREFIX;
use crate::paths::{MissingArtifact, require};
use crate::tool::{Invocation, ToolError, ToolRunner};
use crate::types::SourceInfo;

use tags::{ReleaseTag, display_version, latest_release, parse_ls_remote};

const GIT: &str = "git";

#[derive(Debug, Error)]
pub enum SourceError {
  #[error(transparent)]
  Tool(#[from] ToolError),

  /// No `boost-X.Y.Z` tag exists in the repository.
  #[error("no release tag found in {origin}")]
  NoReleaseTag { origin: String },

  #[error(transparent)]
  Missing(#[from] MissingArtifact),

  #[error("failed to update '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Bring the checkout up to date and patch the build configuration.
pub async fn synchronize<R: ToolRunner>(config: &Config, runner: &R) -> Result<SourceInfo, SourceError> {
  let checkout = config.checkout_dir();

  if checkout.join(".git").exists() {
    update_checkout(&checkout, runner).await?;
  } else {
    clone_latest(config, &checkout, runner).await?;
  }

  let tag = current_tag(&checkout, runner).await?;
  let version = display_version(&tag);
  info!(tag = %tag, version = %version, "sources synchronized");

  patch_user_config(config, runner).await?;

  Ok(SourceInfo {
    path: checkout,
    tag,
    version,
  })
}

async fn update_checkout<R: ToolRunner>(checkout: &Path, runner: &R) -> Result<(), SourceError> {
  info!(path = %checkout.display(), "updating existing checkout");
  let git = || Invocation::new(GIT).current_dir(checkout);

  runner.run(&git().args(["clean", "-fdx"])).await?;
  runner.run(&git().args(["fetch", "--tags", "origin"]).streaming()).await?;

  let listed = runner.run(&git().args(["tag", "--list"]).arg(tag_pattern())).await?;
  let latest = latest_release(listed.stdout.lines()).ok_or_else(|| SourceError::NoReleaseTag {
    origin: checkout.display().to_string(),
  })?;
  info!(tag = %latest, "checking out release");

  runner.run(&git().args(["checkout", "--quiet"]).arg(&latest.name)).await?;
  runner
    .run(&git().args(["submodule", "update", "--init", "--recursive"]).streaming())
    .await?;
  Ok(())
}

async fn clone_latest<R: ToolRunner>(config: &Config, checkout: &Path, runner: &R) -> Result<(), SourceError> {
  fs::create_dir_all(&config.src_dir).map_err(|source| SourceError::Io {
    path: config.src_dir.clone(),
    source,
  })?;

  let latest = latest_remote_release(&config.repo_url, runner).await?;
  info!(url = %config.repo_url, tag = %latest, path = %checkout.display(), "cloning release");

  let clone = Invocation::new(GIT)
    .current_dir(&config.src_dir)
    .args(["clone", "--depth", "1", "--branch"])
    .arg(&latest.name)
    .args(["--recurse-submodules", "--shallow-submodules"])
    .arg(&config.repo_url)
    .arg(checkout)
    .streaming();
  runner.run(&clone).await?;
  Ok(())
}

/// Newest release tag advertised by the remote.
pub async fn latest_remote_release<R: ToolRunner>(url: &str, runner: &R) -> Result<ReleaseTag, SourceError> {
  let listing = Invocation::new(GIT)
    .args(["ls-remote", "--tags", "--refs", url])
    .arg(tag_pattern());
  let output = runner.run(&listing).await?;

  let names = parse_ls_remote(&output.stdout);
  debug!(count = names.len(), "remote tags listed");
  latest_release(names).ok_or_else(|| SourceError::NoReleaseTag {
    origin: url.to_string(),
  })
}

async fn current_tag<R: ToolRunner>(checkout: &Path, runner: &R) -> Result<String, SourceError> {
  let describe = Invocation::new(GIT)
    .current_dir(checkout)
    .args(["describe", "--tags", "--abbrev=0"]);
  let output = runner.run(&describe).await?;
  Ok(output.stdout.trim().to_string())
}

/// Append the iOS toolset blocks unless the file already carries uncommitted changes.
///
/// Returns whether the file was modified.
pub async fn patch_user_config<R: ToolRunner>(config: &Config, runner: &R) -> Result<bool, SourceError> {
  let jam = config.paths().user_config_jam();
  let jam_dir = require(jam.parent().unwrap_or(Path::new(".")))?;
  let file_name = jam.file_name().map(|n| n.to_os_string()).unwrap_or_default();

  let status = Invocation::new(GIT)
    .current_dir(&jam_dir)
    .args(["status", "--porcelain", "--"])
    .arg(&file_name);
  let output = runner.run(&status).await?;

  if !output.stdout.trim().is_empty() {
    info!(path = %jam.display(), "user-config.jam already modified, leaving it alone");
    return Ok(false);
  }

  let directives = jam::toolset_directives(config);
  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&jam)
    .map_err(|source| SourceError::Io {
      path: jam.clone(),
      source,
    })?;
  file
    .write_all(format!("\n{}", directives).as_bytes())
    .map_err(|source| SourceError::Io {
      path: jam.clone(),
      source,
    })?;

  info!(path = %jam.display(), "registered iOS toolsets");
  Ok(true)
}

fn tag_pattern() -> String {
  format!("{}*", RELEASE_TAG_PREFIX)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{FakeToolchain, test_config};
  use tempfile::TempDir;

  #[tokio::test]
  async fn fresh_clone_checks_out_newest_release() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path(), &["thread"]);
    let fake = FakeToolchain::new().with_remote_tags(&["boost-1.9.0", "boost-1.86.0", "boost-1.87.0.beta1"]);

    let info = synchronize(&config, &fake).await.unwrap();

    assert_eq!(info.tag, "boost-1.86.0");
    assert_eq!(info.version, "1.86.0");
    assert_eq!(info.path, config.checkout_dir());

    let clone = fake.find("git", "clone").expect("clone invocation");
    let args = clone.args_lossy();
    let branch = args.iter().position(|a| a == "--branch").unwrap();
    assert_eq!(args[branch + 1], "boost-1.86.0");
  }

  #[tokio::test]
  async fn existing_checkout_is_cleaned_and_updated() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path(), &["thread"]);
    let fake = FakeToolchain::new().with_remote_tags(&["boost-1.85.0"]);
    synchronize(&config, &fake).await.unwrap();

    let fake = FakeToolchain::new().with_local_tags(&["boost-1.85.0", "boost-1.86.0"]);
    let info = synchronize(&config, &fake).await.unwrap();

    assert!(fake.find("git", "clone").is_none());
    assert!(fake.find("git", "-fdx").is_some());
    let checkout = fake.find("git", "checkout").unwrap();
    assert_eq!(checkout.args_lossy().last().map(String::as_str), Some("boost-1.86.0"));
    assert_eq!(info.version, "1.86.0");
  }

  #[tokio::test]
  async fn toolsets_are_appended_once() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path(), &["thread"]);
    let fake = FakeToolchain::new().with_remote_tags(&["boost-1.86.0"]);

    synchronize(&config, &fake).await.unwrap();
    let patched = patch_user_config(&config, &fake).await.unwrap();

    assert!(!patched);
    let jam = fs::read_to_string(config.paths().user_config_jam()).unwrap();
    assert_eq!(jam.matches("using darwin : 6.1~iphone\n").count(), 1);
    assert_eq!(jam.matches("using darwin : 6.1~iphonesim\n").count(), 1);
  }

  #[tokio::test]
  async fn remote_without_releases_is_fatal() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path(), &["thread"]);
    let fake = FakeToolchain::new().with_remote_tags(&["boost-1.87.0.beta1"]);

    let err = synchronize(&config, &fake).await.unwrap_err();
    assert!(matches!(err, SourceError::NoReleaseTag { .. }));
    assert!(fake.find("git", "clone").is_none());
  }

  #[tokio::test]
  async fn git_failures_propagate() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path(), &["thread"]);
    let fake = FakeToolchain::new()
      .with_remote_tags(&["boost-1.86.0"])
      .fail_on("git", "clone", 128);

    let err = synchronize(&config, &fake).await.unwrap_err();
    assert!(matches!(err, SourceError::Tool(ToolError::Failed { code: Some(128), .. })));
  }
}

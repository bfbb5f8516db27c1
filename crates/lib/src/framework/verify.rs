//! Structural check of a finished bundle.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::consts::FRAMEWORK_NAME;
use crate::util::hash::{ContentHash, DirHashError, hash_directory};

use super::BUNDLE_DIRS;

#[derive(Debug, Error)]
pub enum VerifyError {
  #[error("not a framework bundle: {}", path.display())]
  NotABundle { path: PathBuf },

  #[error("{} must be a symlink", path.display())]
  NotASymlink { path: PathBuf },

  #[error("{} does not resolve inside {}", link.display(), expected.display())]
  BadTarget { link: PathBuf, expected: PathBuf },

  #[error("missing {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed to inspect {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Hash(#[from] DirHashError),
}

/// What a valid bundle contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleSummary {
  pub path: PathBuf,
  /// Name of the directory `Versions/Current` points at.
  pub version: String,
  pub has_binary: bool,
  pub header_files: usize,
  pub digest: ContentHash,
}

/// Check the bundle's symlink layout and compute its content digest.
pub fn verify_bundle(bundle: &Path) -> Result<BundleSummary, VerifyError> {
  if !bundle.is_dir() {
    return Err(VerifyError::NotABundle {
      path: bundle.to_path_buf(),
    });
  }

  let versions = canonical(&bundle.join("Versions"))?;
  let current_link = bundle.join("Versions").join("Current");
  expect_symlink(&current_link)?;
  let current = canonical(&current_link)?;
  if !current.is_dir() || current.parent() != Some(versions.as_path()) {
    return Err(VerifyError::BadTarget {
      link: current_link,
      expected: versions,
    });
  }

  for name in BUNDLE_DIRS {
    check_alias(bundle, name, &current)?;
  }
  let has_binary = fs::symlink_metadata(bundle.join(FRAMEWORK_NAME)).is_ok();
  if has_binary {
    check_alias(bundle, FRAMEWORK_NAME, &current)?;
  }

  let plist = current.join("Resources").join("Info.plist");
  if !plist.is_file() {
    return Err(VerifyError::Missing { path: plist });
  }

  let header_files = WalkDir::new(current.join("Headers"))
    .into_iter()
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .count();

  Ok(BundleSummary {
    path: bundle.to_path_buf(),
    version: current
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default(),
    has_binary,
    header_files,
    digest: hash_directory(bundle, &[])?,
  })
}

/// `<bundle>/<name>` must be a symlink resolving to `<current>/<name>`.
fn check_alias(bundle: &Path, name: &str, current: &Path) -> Result<(), VerifyError> {
  let link = bundle.join(name);
  expect_symlink(&link)?;
  let resolved = canonical(&link)?;
  let expected = current.join(name);
  if resolved != expected {
    return Err(VerifyError::BadTarget { link, expected });
  }
  Ok(())
}

fn expect_symlink(path: &Path) -> Result<(), VerifyError> {
  match fs::symlink_metadata(path) {
    Ok(meta) if meta.file_type().is_symlink() => Ok(()),
    Ok(_) => Err(VerifyError::NotASymlink {
      path: path.to_path_buf(),
    }),
    Err(_) => Err(VerifyError::Missing {
      path: path.to_path_buf(),
    }),
  }
}

fn canonical(path: &Path) -> Result<PathBuf, VerifyError> {
  dunce::canonicalize(path).map_err(|source| match source.kind() {
    std::io::ErrorKind::NotFound => VerifyError::Missing {
      path: path.to_path_buf(),
    },
    _ => VerifyError::Io {
      path: path.to_path_buf(),
      source,
    },
  })
}

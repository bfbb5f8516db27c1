//! Framework packager.
//!
//! Assembles `boost.framework` from the universal archive, the installed
//! headers and a fixed `Info.plist`:
//!
//! ```text
//! boost.framework/
//! ├── Versions/
//! │   ├── A/{Headers/, Resources/Info.plist, Documentation/, boost}
//! │   └── Current -> A
//! ├── Headers -> Versions/Current/Headers
//! ├── Resources -> Versions/Current/Resources
//! ├── Documentation -> Versions/Current/Documentation
//! └── boost -> Versions/Current/boost
//! ```
//!
//! The bundle is removed and rebuilt from scratch on every run.

pub mod plist;
pub mod verify;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::consts::{FRAMEWORK_NAME, FRAMEWORK_VERSION};
use crate::paths::{MissingArtifact, require};
use crate::util::fs::{copy_tree, remove_dir_if_exists, symlink};

pub use verify::{BundleSummary, VerifyError, verify_bundle};

/// Directories every version of the bundle carries.
pub const BUNDLE_DIRS: [&str; 3] = ["Headers", "Resources", "Documentation"];

#[derive(Debug, Error)]
pub enum FrameworkError {
  #[error(transparent)]
  Missing(#[from] MissingArtifact),

  #[error("failed to assemble bundle at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> FrameworkError + '_ {
  move |source| FrameworkError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Build the bundle.
///
/// `binary` is the universal archive; without one the bundle carries headers
/// only and the top-level binary alias is not created.
pub fn package(config: &Config, version: &str, binary: Option<&Path>) -> Result<PathBuf, FrameworkError> {
  let paths = config.paths();
  let bundle = paths.bundle();
  let version_dir = paths.bundle_version_dir();
  let headers = require(paths.prefix_headers())?;
  info!(bundle = %bundle.display(), version = %version, "framing");

  remove_dir_if_exists(&bundle).map_err(io_err(&bundle))?;
  for dir in BUNDLE_DIRS {
    let path = version_dir.join(dir);
    fs::create_dir_all(&path).map_err(io_err(&path))?;
  }

  let current = bundle.join("Versions").join("Current");
  symlink(Path::new(FRAMEWORK_VERSION), &current).map_err(io_err(&current))?;
  for dir in BUNDLE_DIRS {
    link_alias(&bundle, dir)?;
  }

  match binary {
    Some(binary) => {
      let binary = require(binary)?;
      let dest = version_dir.join(FRAMEWORK_NAME);
      fs::copy(&binary, &dest).map_err(io_err(&dest))?;
      link_alias(&bundle, FRAMEWORK_NAME)?;
    }
    None => warn!("no universal archive, bundle will carry headers only"),
  }

  let header_dest = version_dir.join("Headers");
  let copied = copy_tree(&headers, &header_dest).map_err(io_err(&header_dest))?;
  info!(files = copied, "copied headers");

  let plist_path = version_dir.join("Resources").join("Info.plist");
  fs::write(&plist_path, plist::info_plist(version)).map_err(io_err(&plist_path))?;

  Ok(bundle)
}

/// `<bundle>/<name> -> Versions/Current/<name>`
fn link_alias(bundle: &Path, name: &str) -> Result<(), FrameworkError> {
  let link = bundle.join(name);
  let target = Path::new("Versions").join("Current").join(name);
  symlink(&target, &link).map_err(io_err(&link))
}

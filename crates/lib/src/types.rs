use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::consts::LIB_PREFIX;

/// A library name that is not a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid library name '{0}': expected ASCII letters, digits or '_'")]
pub struct InvalidLibraryName(pub String);

/// One Boost library to build, e.g. `thread` or `program_options`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LibraryName(String);

impl LibraryName {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// File name of this library's archive: `libboost_<name>.a`.
  pub fn archive_file_name(&self) -> String {
    format!("{}{}.a", LIB_PREFIX, self.0)
  }

  /// Whether `file_name` is one of the archive names b2 emits for this library.
  ///
  /// Accepts the plain `libboost_<name>.a` and the tagged `libboost_<name>-<tags>.a` layouts.
  pub fn matches_archive(&self, file_name: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(LIB_PREFIX).and_then(|r| r.strip_prefix(self.0.as_str())) else {
      return false;
    };
    rest == ".a" || (rest.starts_with('-') && rest.ends_with(".a"))
  }
}

impl FromStr for LibraryName {
  type Err = InvalidLibraryName;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let valid = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
      Ok(Self(s.to_string()))
    } else {
      Err(InvalidLibraryName(s.to_string()))
    }
  }
}

impl fmt::Display for LibraryName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// The checkout produced by source synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
  pub path: PathBuf,
  /// Release tag that is checked out, e.g. `boost-1.86.0`.
  pub tag: String,
  /// Human-readable version, e.g. `1.86.0`.
  pub version: String,
}

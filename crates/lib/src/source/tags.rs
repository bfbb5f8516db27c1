//! Release tag parsing and selection.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

use crate::consts::RELEASE_TAG_PREFIX;

/// A `boost-MAJOR.MINOR.PATCH` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
  pub name: String,
  pub version: Version,
}

impl ReleaseTag {
  /// Parse a tag name; betas, release candidates and foreign tags yield `None`.
  pub fn parse(name: &str) -> Option<Self> {
    let name = name.trim();
    let raw = name.strip_prefix(RELEASE_TAG_PREFIX)?;
    let version = Version::parse(raw).ok()?;
    if !version.pre.is_empty() || !version.build.is_empty() {
      return None;
    }
    Some(Self {
      name: name.to_string(),
      version,
    })
  }
}

impl Ord for ReleaseTag {
  fn cmp(&self, other: &Self) -> Ordering {
    self.version.cmp(&other.version)
  }
}

impl PartialOrd for ReleaseTag {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for ReleaseTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// Newest release among the given tag names.
pub fn latest_release<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<ReleaseTag> {
  names.into_iter().filter_map(ReleaseTag::parse).max()
}

/// Tag names from `git ls-remote --tags --refs` output (`<sha>\trefs/tags/<name>`).
pub fn parse_ls_remote(output: &str) -> Vec<&str> {
  output
    .lines()
    .filter_map(|line| line.split_whitespace().nth(1))
    .filter_map(|reference| reference.strip_prefix("refs/tags/"))
    .collect()
}

/// Version string shown to users for a checked-out tag.
pub fn display_version(tag: &str) -> String {
  let tag = tag.trim();
  tag.strip_prefix(RELEASE_TAG_PREFIX).unwrap_or(tag).to_string()
}

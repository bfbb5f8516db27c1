//! Content digests of produced artifacts.
//!
//! Used to compare bundles across runs: two builds of the same release with the
//! same configuration must produce the same [`ContentHash`].

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Full lowercase hex SHA-256 digest (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk {}: {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Digest of a directory tree.
///
/// Covers relative paths, file contents and symlink targets (symlinks are not
/// followed), but no metadata such as timestamps or permissions. Entries whose
/// file name is in `exclude` are skipped together with their children.
pub fn hash_directory(path: &Path, exclude: &[&str]) -> Result<ContentHash, DirHashError> {
  let walker = WalkDir::new(path).sort_by_file_name().into_iter().filter_entry(|e| {
    e.file_name()
      .to_str()
      .map(|name| !exclude.contains(&name))
      .unwrap_or(true)
  });

  let mut hasher = Sha256::new();
  for entry in walker {
    let entry = entry.map_err(|source| DirHashError::Walk {
      path: path.to_path_buf(),
      source,
    })?;
    let entry_path = entry.path();
    let rel = entry_path.strip_prefix(path).unwrap_or(entry_path).to_string_lossy();
    if rel.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let line = if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|source| DirHashError::Read {
        path: entry_path.to_path_buf(),
        source,
      })?;
      format!("L:{}:{}", rel, target.to_string_lossy())
    } else if file_type.is_dir() {
      format!("D:{}", rel)
    } else if file_type.is_file() {
      format!("F:{}:{}", rel, hash_file(entry_path)?)
    } else {
      continue;
    };

    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Digest of one file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let read_err = |source| DirHashError::Read {
    path: path.to_path_buf(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];
  loop {
    let n = file.read(&mut buffer).map_err(read_err)?;
    if n == 0 {
      break;
    }
    hasher.update(&buffer[..n]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

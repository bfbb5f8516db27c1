//! Filesystem helpers shared by the stages.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Remove a directory tree if present.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
  match fs::symlink_metadata(path) {
    Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map(|_| true),
    Ok(_) => fs::remove_file(path).map(|_| true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}

/// Remove a file if present.
pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
  match fs::remove_file(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}

/// Copy the contents of `src` into `dst`, dereferencing symlinks.
///
/// b2 materializes the header tree as symlinks into each library, so the
/// copy has to follow them to produce a self-contained tree. Returns the number
/// of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<usize> {
  fs::create_dir_all(dst)?;
  let mut copied = 0;

  for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    let rel = match entry.path().strip_prefix(src) {
      Ok(rel) if !rel.as_os_str().is_empty() => rel,
      _ => continue,
    };
    let target = dst.join(rel);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Create a symlink at `link` pointing to `target` (taken verbatim, usually relative).
#[cfg(unix)]
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  let resolved = link.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
  if resolved.is_dir() {
    std::os::windows::fs::symlink_dir(target, link)
  } else {
    std::os::windows::fs::symlink_file(target, link)
  }
}

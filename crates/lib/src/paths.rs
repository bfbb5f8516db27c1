//! Artifact path builder.
//!
//! Every location the pipeline reads or writes is derived here from the
//! [`Config`], a library name, a target, and the build phase. The nested layout
//! of b2's native output directories is reproduced exactly so that later stages
//! can find what the build driver produced.
//!
//! # Layout
//!
//! ```text
//! {src}/boost/                                  checkout
//! ├── iphone-build/stage/lib/libboost_<lib>.a    device staged archive (fat, arm slices)
//! ├── iphonesim-build/stage/lib/libboost_<lib>.a simulator staged archive
//! └── bin.v2/libs/<lib>/build/darwin-<sdk>~<platform>/release/...  native archives
//! {build}/<arch>/{libboost_<lib>.a, obj/, libboost.a}
//! {build}/libboost.a                            universal uber archive
//! {prefix}/{include/boost, lib/libboost_<lib>.a}
//! {framework}/boost.framework/Versions/A/...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Config;
use crate::consts::{FRAMEWORK_NAME, FRAMEWORK_VERSION, UBER_ARCHIVE, USER_CONFIG_JAM};
use crate::platform::{Arch, Platform};
use crate::types::LibraryName;

/// An artifact a stage depends on is not where the convention puts it.
#[derive(Debug, Error)]
#[error("expected artifact not found: {}", path.display())]
pub struct MissingArtifact {
  pub path: PathBuf,
}

/// Failure to locate a native archive.
#[derive(Debug, Error)]
pub enum LocateError {
  #[error(transparent)]
  Missing(#[from] MissingArtifact),

  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Derives artifact locations from a configuration.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactPaths<'a> {
  config: &'a Config,
}

impl<'a> ArtifactPaths<'a> {
  pub fn new(config: &'a Config) -> Self {
    Self { config }
  }

  /// The git checkout of the sources.
  pub fn checkout(&self) -> PathBuf {
    self.config.checkout_dir()
  }

  /// Build configuration file patched with the iOS toolsets.
  pub fn user_config_jam(&self) -> PathBuf {
    self.checkout().join(USER_CONFIG_JAM)
  }

  /// `<xcode>/Platforms/<sdk>.platform/Developer`
  pub fn platform_developer_dir(&self, platform: Platform) -> PathBuf {
    self
      .config
      .xcode_root
      .join("Platforms")
      .join(format!("{}.platform", platform.sdk_name()))
      .join("Developer")
  }

  /// An executable from the platform's toolchain, e.g. `lipo`, `ar` or the compiler.
  pub fn tool(&self, platform: Platform, name: &str) -> PathBuf {
    self.platform_developer_dir(platform).join("usr").join("bin").join(name)
  }

  /// System headers of the platform SDK for the configured version.
  pub fn sdk_include_dir(&self, platform: Platform) -> PathBuf {
    self
      .platform_developer_dir(platform)
      .join("SDKs")
      .join(format!("{}{}.sdk", platform.sdk_name(), self.config.sdk_version))
      .join("usr")
      .join("include")
  }

  /// b2's `--build-dir` for a platform.
  pub fn platform_build_dir(&self, platform: Platform) -> PathBuf {
    self.checkout().join(platform.build_dir_name())
  }

  /// b2's `--stagedir` for a platform.
  pub fn stage_dir(&self, platform: Platform) -> PathBuf {
    self.platform_build_dir(platform).join("stage")
  }

  /// Staged archive of one library for one platform.
  pub fn staged_archive(&self, library: &LibraryName, platform: Platform) -> PathBuf {
    self.stage_dir(platform).join("lib").join(library.archive_file_name())
  }

  /// Directory b2 writes a library's static archive to, following its property-path convention.
  pub fn native_archive_dir(&self, library: &LibraryName, platform: Platform) -> PathBuf {
    let sdk = &self.config.sdk_version;
    self
      .checkout()
      .join("bin.v2")
      .join("libs")
      .join(library.as_str())
      .join("build")
      .join(format!("darwin-{}", platform.toolset_version(sdk)))
      .join("release")
      .join(format!("architecture-{}", platform.build_architecture()))
      .join("link-static")
      .join(format!("macosx-version-{}-{}", platform.as_str(), sdk))
      .join("target-os-iphone")
      .join("threading-multi")
  }

  /// The native archive of one library for one platform, which must exist.
  ///
  /// b2 may decorate the file name with toolset tags, so the first matching
  /// `libboost_<lib>*.a` in the native directory is returned.
  pub fn native_archive(&self, library: &LibraryName, platform: Platform) -> Result<PathBuf, LocateError> {
    let dir = self.native_archive_dir(library, platform);
    let io_err = |source| LocateError::Io {
      path: dir.clone(),
      source,
    };
    let missing = || MissingArtifact {
      path: dir.join(library.archive_file_name()),
    };

    let entries = match fs::read_dir(&dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing().into()),
      Err(e) => return Err(io_err(e)),
    };

    let mut matches = Vec::new();
    for entry in entries {
      let entry = entry.map_err(io_err)?;
      if entry.file_type().map_err(io_err)?.is_file()
        && library.matches_archive(&entry.file_name().to_string_lossy())
      {
        matches.push(entry.path());
      }
    }
    matches.sort();

    matches.into_iter().next().ok_or_else(|| missing().into())
  }

  /// Installed header tree.
  pub fn prefix_headers(&self) -> PathBuf {
    self.config.prefix_dir.join("include").join("boost")
  }

  pub fn prefix_lib_dir(&self) -> PathBuf {
    self.config.prefix_dir.join("lib")
  }

  /// Universal per-library archive written by the archive merger.
  pub fn merged_archive(&self, library: &LibraryName) -> PathBuf {
    self.prefix_lib_dir().join(library.archive_file_name())
  }

  /// Staging directory for one architecture.
  pub fn arch_dir(&self, arch: Arch) -> PathBuf {
    self.config.build_dir.join(arch.as_str())
  }

  /// Thin (single architecture) copy of a library's archive.
  pub fn thin_archive(&self, library: &LibraryName, arch: Arch) -> PathBuf {
    self.arch_dir(arch).join(library.archive_file_name())
  }

  /// Flat object-file directory shared by every library of one architecture.
  pub fn obj_dir(&self, arch: Arch) -> PathBuf {
    self.arch_dir(arch).join("obj")
  }

  /// All objects of one architecture relinked into one archive.
  pub fn consolidated_archive(&self, arch: Arch) -> PathBuf {
    self.arch_dir(arch).join(UBER_ARCHIVE)
  }

  /// Consolidated archives of every architecture fused together.
  pub fn universal_archive(&self) -> PathBuf {
    self.config.build_dir.join(UBER_ARCHIVE)
  }

  /// `<framework>/boost.framework`
  pub fn bundle(&self) -> PathBuf {
    self.config.framework_dir.join(format!("{}.framework", FRAMEWORK_NAME))
  }

  /// `<bundle>/Versions/A`
  pub fn bundle_version_dir(&self) -> PathBuf {
    self.bundle().join("Versions").join(FRAMEWORK_VERSION)
  }

  /// Every directory the cleaner wipes before a run.
  pub fn generated_dirs(&self) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Platform::ALL.iter().map(|p| self.platform_build_dir(*p)).collect();
    dirs.push(self.config.prefix_dir.clone());
    dirs.push(self.config.build_dir.clone());
    dirs.push(self.config.framework_dir.clone());
    dirs
  }
}

/// Return `path` if it exists, otherwise a [`MissingArtifact`] naming it.
pub fn require(path: impl AsRef<Path>) -> Result<PathBuf, MissingArtifact> {
  let path = path.as_ref();
  if path.exists() {
    Ok(path.to_path_buf())
  } else {
    Err(MissingArtifact {
      path: path.to_path_buf(),
    })
  }
}

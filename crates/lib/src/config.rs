//! Pipeline configuration.
//!
//! A [`Config`] is resolved once at startup from environment variables (each optional,
//! with defaults) and then passed by reference into every stage. Relative directories
//! are resolved against a base directory, normally the current working directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::consts::CHECKOUT_DIR;
use crate::paths::ArtifactPaths;
use crate::types::{InvalidLibraryName, LibraryName};

/// Environment variable names read by [`Config::from_env`].
pub mod vars {
  pub const LIBS: &str = "BOOST_LIBS";
  pub const SDK_VERSION: &str = "IPHONE_SDKVERSION";
  pub const XCODE_ROOT: &str = "XCODE_ROOT";
  pub const EXTRA_CPPFLAGS: &str = "EXTRA_CPPFLAGS";
  pub const COMPILER: &str = "COMPILER";
  pub const SRC_DIR: &str = "SRCDIR";
  pub const BUILD_DIR: &str = "BUILDDIR";
  pub const PREFIX_DIR: &str = "PREFIXDIR";
  pub const FRAMEWORK_DIR: &str = "FRAMEWORKDIR";
  pub const REPO: &str = "BOOST_REPO";
  pub const JOBS: &str = "BOOST_JOBS";
}

pub const DEFAULT_LIBS: &str = "thread signals filesystem regex program_options system";
pub const DEFAULT_SDK_VERSION: &str = "6.1";
pub const DEFAULT_XCODE_ROOT: &str = "/Applications/Xcode.app/Contents/Developer";
/// Pthread-based atomics; the ARM spinlock fallback is not safe on multi-core devices.
pub const DEFAULT_EXTRA_CPPFLAGS: &str = "-DBOOST_AC_USE_PTHREADS -DBOOST_SP_USE_PTHREADS";
pub const DEFAULT_COMPILER: &str = "clang++";
pub const DEFAULT_REPO: &str = "https://github.com/boostorg/boost.git";
pub const DEFAULT_JOBS: u32 = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value for {var}: {message}")]
  InvalidValue { var: &'static str, message: String },

  #[error(transparent)]
  InvalidLibrary(#[from] InvalidLibraryName),
}

/// Immutable settings shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
  /// Libraries to build, in order, without duplicates.
  pub libraries: Vec<LibraryName>,
  /// iOS SDK version, e.g. `6.1`.
  pub sdk_version: String,
  /// Xcode developer directory containing `Platforms/`.
  pub xcode_root: PathBuf,
  /// Appended to every compiler invocation.
  pub extra_cppflags: String,
  /// Compiler executable inside each platform's `usr/bin`.
  pub compiler: String,
  pub src_dir: PathBuf,
  pub build_dir: PathBuf,
  pub prefix_dir: PathBuf,
  pub framework_dir: PathBuf,
  /// Git remote the sources are cloned from.
  pub repo_url: String,
  /// Parallel job hint passed to b2.
  pub jobs: u32,
}

impl Config {
  /// Defaults for every setting, with directories rooted at `base_dir`.
  pub fn defaults(base_dir: &Path) -> Self {
    Self {
      libraries: parse_libraries(DEFAULT_LIBS).unwrap_or_default(),
      sdk_version: DEFAULT_SDK_VERSION.to_string(),
      xcode_root: PathBuf::from(DEFAULT_XCODE_ROOT),
      extra_cppflags: DEFAULT_EXTRA_CPPFLAGS.to_string(),
      compiler: DEFAULT_COMPILER.to_string(),
      src_dir: base_dir.join("src"),
      build_dir: base_dir.join("build"),
      prefix_dir: base_dir.join("prefix"),
      framework_dir: base_dir.join("framework"),
      repo_url: DEFAULT_REPO.to_string(),
      jobs: DEFAULT_JOBS,
    }
  }

  /// Resolve the configuration from the process environment.
  pub fn from_env(base_dir: &Path) -> Result<Self, ConfigError> {
    Self::from_lookup(base_dir, |name| std::env::var(name).ok())
  }

  /// Resolve the configuration using `lookup` to read variables.
  ///
  /// Empty values count as unset, except for `BOOST_LIBS` where an empty value selects
  /// no libraries at all.
  pub fn from_lookup<F>(base_dir: &Path, lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let set = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let mut config = Self::defaults(base_dir);

    if let Some(libs) = lookup(vars::LIBS) {
      config.libraries = parse_libraries(&libs)?;
    }
    if let Some(sdk) = set(vars::SDK_VERSION) {
      config.sdk_version = parse_sdk_version(vars::SDK_VERSION, &sdk)?;
    }
    if let Some(root) = set(vars::XCODE_ROOT) {
      config.xcode_root = PathBuf::from(root);
    }
    if let Some(flags) = set(vars::EXTRA_CPPFLAGS) {
      config.extra_cppflags = flags.trim().to_string();
    }
    if let Some(compiler) = set(vars::COMPILER) {
      config.compiler = compiler;
    }
    if let Some(dir) = set(vars::SRC_DIR) {
      config.src_dir = resolve_dir(base_dir, &dir);
    }
    if let Some(dir) = set(vars::BUILD_DIR) {
      config.build_dir = resolve_dir(base_dir, &dir);
    }
    if let Some(dir) = set(vars::PREFIX_DIR) {
      config.prefix_dir = resolve_dir(base_dir, &dir);
    }
    if let Some(dir) = set(vars::FRAMEWORK_DIR) {
      config.framework_dir = resolve_dir(base_dir, &dir);
    }
    if let Some(repo) = set(vars::REPO) {
      config.repo_url = repo;
    }
    if let Some(jobs) = set(vars::JOBS) {
      config.jobs = parse_jobs(vars::JOBS, &jobs)?;
    }

    Ok(config)
  }

  /// Location of the git checkout inside the source directory.
  pub fn checkout_dir(&self) -> PathBuf {
    self.src_dir.join(CHECKOUT_DIR)
  }

  /// Path builder for every artifact this configuration produces.
  pub fn paths(&self) -> ArtifactPaths<'_> {
    ArtifactPaths::new(self)
  }
}

/// Split a whitespace-separated library list, dropping repeated names.
pub fn parse_libraries(value: &str) -> Result<Vec<LibraryName>, InvalidLibraryName> {
  let mut libraries: Vec<LibraryName> = Vec::new();
  for token in value.split_whitespace() {
    let name: LibraryName = token.parse()?;
    if !libraries.contains(&name) {
      libraries.push(name);
    }
  }
  Ok(libraries)
}

/// Parse a parallel job count; zero is rejected.
pub fn parse_jobs(var: &'static str, value: &str) -> Result<u32, ConfigError> {
  match value.trim().parse::<u32>() {
    Ok(0) => Err(ConfigError::InvalidValue {
      var,
      message: "job count must be at least 1".to_string(),
    }),
    Ok(jobs) => Ok(jobs),
    Err(e) => Err(ConfigError::InvalidValue {
      var,
      message: format!("'{}' is not a number: {}", value, e),
    }),
  }
}

/// Validate an SDK version such as `6.1`; it is interpolated into paths and toolset names.
pub fn parse_sdk_version(var: &'static str, value: &str) -> Result<String, ConfigError> {
  let value = value.trim();
  let valid = value.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
  if valid {
    Ok(value.to_string())
  } else {
    Err(ConfigError::InvalidValue {
      var,
      message: format!("'{}' is not a dotted version number", value),
    })
  }
}

/// Resolve `value` against `base_dir` unless it is already absolute.
pub fn resolve_dir(base_dir: &Path, value: &str) -> PathBuf {
  let path = Path::new(value);
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base_dir.join(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn defaults_are_rooted_at_base_dir() {
    let config = Config::from_lookup(Path::new("/work"), lookup_from(&[])).unwrap();
    assert_eq!(config.src_dir, PathBuf::from("/work/src"));
    assert_eq!(config.build_dir, PathBuf::from("/work/build"));
    assert_eq!(config.prefix_dir, PathBuf::from("/work/prefix"));
    assert_eq!(config.framework_dir, PathBuf::from("/work/framework"));
    assert_eq!(config.checkout_dir(), PathBuf::from("/work/src/boost"));
    assert_eq!(config.libraries.len(), 6);
    assert_eq!(config.jobs, DEFAULT_JOBS);
    assert!(config.extra_cppflags.contains("BOOST_SP_USE_PTHREADS"));
  }

  #[test]
  fn variables_override_defaults() {
    let config = Config::from_lookup(
      Path::new("/work"),
      lookup_from(&[
        (vars::LIBS, "thread system"),
        (vars::SDK_VERSION, "7.0"),
        (vars::BUILD_DIR, "out/build"),
        (vars::PREFIX_DIR, "/abs/prefix"),
        (vars::COMPILER, "g++"),
        (vars::JOBS, "4"),
      ]),
    )
    .unwrap();

    let libs: Vec<&str> = config.libraries.iter().map(|l| l.as_str()).collect();
    assert_eq!(libs, vec!["thread", "system"]);
    assert_eq!(config.sdk_version, "7.0");
    assert_eq!(config.build_dir, PathBuf::from("/work/out/build"));
    assert_eq!(config.prefix_dir, PathBuf::from("/abs/prefix"));
    assert_eq!(config.compiler, "g++");
    assert_eq!(config.jobs, 4);
  }

  #[test]
  fn empty_library_list_is_honored() {
    let config = Config::from_lookup(Path::new("/work"), lookup_from(&[(vars::LIBS, "  ")])).unwrap();
    assert!(config.libraries.is_empty());
  }

  #[test]
  fn empty_values_fall_back_to_defaults() {
    let config = Config::from_lookup(Path::new("/work"), lookup_from(&[(vars::SDK_VERSION, ""), (vars::SRC_DIR, "")]))
      .unwrap();
    assert_eq!(config.sdk_version, DEFAULT_SDK_VERSION);
    assert_eq!(config.src_dir, PathBuf::from("/work/src"));
  }

  #[test]
  fn empty_extra_flags_keep_the_pthread_defines() {
    let config = Config::from_lookup(Path::new("/work"), lookup_from(&[(vars::EXTRA_CPPFLAGS, "")])).unwrap();
    assert_eq!(config.extra_cppflags, DEFAULT_EXTRA_CPPFLAGS);

    let config = Config::from_lookup(Path::new("/work"), lookup_from(&[(vars::EXTRA_CPPFLAGS, " -DFOO ")])).unwrap();
    assert_eq!(config.extra_cppflags, "-DFOO");
  }

  #[test]
  fn duplicate_libraries_are_dropped() {
    let libs = parse_libraries("thread system thread").unwrap();
    assert_eq!(libs.len(), 2);
  }

  #[test]
  fn invalid_values_name_the_variable() {
    let err = Config::from_lookup(Path::new("/w"), lookup_from(&[(vars::JOBS, "many")])).unwrap_err();
    assert!(err.to_string().contains(vars::JOBS));

    let err = Config::from_lookup(Path::new("/w"), lookup_from(&[(vars::JOBS, "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { var: vars::JOBS, .. }));

    let err = Config::from_lookup(Path::new("/w"), lookup_from(&[(vars::SDK_VERSION, "6.1/../x")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { var: vars::SDK_VERSION, .. }));

    let err = Config::from_lookup(Path::new("/w"), lookup_from(&[(vars::LIBS, "thread ../etc")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLibrary(_)));
  }

  #[test]
  #[serial]
  fn reads_process_environment() {
    temp_env::with_vars(
      [
        (vars::LIBS, Some("regex")),
        (vars::XCODE_ROOT, Some("/Xcode/Developer")),
        (vars::SRC_DIR, None::<&str>),
      ],
      || {
        let config = Config::from_env(Path::new("/base")).unwrap();
        assert_eq!(config.libraries.len(), 1);
        assert_eq!(config.libraries[0].as_str(), "regex");
        assert_eq!(config.xcode_root, PathBuf::from("/Xcode/Developer"));
        assert_eq!(config.src_dir, PathBuf::from("/base/src"));
      },
    );
  }
}

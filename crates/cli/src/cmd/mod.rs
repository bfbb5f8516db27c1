mod build;
mod clean;
mod config;
mod verify;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use config::cmd_config;
pub use verify::cmd_verify;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use boostframe_lib::config::{Config, vars};

/// Per-invocation overrides of the environment configuration.
///
/// Each flag stands in for the environment variable of the same setting and
/// goes through the same validation.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
  /// Space-separated libraries to build [env: BOOST_LIBS]
  #[arg(long, value_name = "NAMES")]
  pub libs: Option<String>,

  /// iOS SDK version [env: IPHONE_SDKVERSION]
  #[arg(long, value_name = "VERSION")]
  pub sdk_version: Option<String>,

  /// Xcode developer directory [env: XCODE_ROOT]
  #[arg(long, value_name = "DIR")]
  pub xcode_root: Option<PathBuf>,

  /// Compiler executable [env: COMPILER]
  #[arg(long)]
  pub compiler: Option<String>,

  /// Extra preprocessor flags [env: EXTRA_CPPFLAGS]
  #[arg(long, value_name = "FLAGS", allow_hyphen_values = true)]
  pub extra_cppflags: Option<String>,

  /// Source directory holding the checkout [env: SRCDIR]
  #[arg(long, value_name = "DIR")]
  pub src_dir: Option<PathBuf>,

  /// Per-architecture staging directory [env: BUILDDIR]
  #[arg(long, value_name = "DIR")]
  pub build_dir: Option<PathBuf>,

  /// Install prefix for headers and merged archives [env: PREFIXDIR]
  #[arg(long, value_name = "DIR")]
  pub prefix_dir: Option<PathBuf>,

  /// Output directory for the bundle [env: FRAMEWORKDIR]
  #[arg(long, value_name = "DIR")]
  pub framework_dir: Option<PathBuf>,

  /// Git remote to clone from [env: BOOST_REPO]
  #[arg(long, value_name = "URL")]
  pub repo: Option<String>,

  /// Parallel jobs passed to b2 [env: BOOST_JOBS]
  #[arg(long, short = 'j', value_name = "N")]
  pub jobs: Option<u32>,
}

impl ConfigArgs {
  /// Flag value for an environment variable name, if the flag was given.
  fn lookup(&self, name: &str) -> Option<String> {
    let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
    match name {
      vars::LIBS => self.libs.clone(),
      vars::SDK_VERSION => self.sdk_version.clone(),
      vars::XCODE_ROOT => path(&self.xcode_root),
      vars::COMPILER => self.compiler.clone(),
      vars::EXTRA_CPPFLAGS => self.extra_cppflags.clone(),
      vars::SRC_DIR => path(&self.src_dir),
      vars::BUILD_DIR => path(&self.build_dir),
      vars::PREFIX_DIR => path(&self.prefix_dir),
      vars::FRAMEWORK_DIR => path(&self.framework_dir),
      vars::REPO => self.repo.clone(),
      vars::JOBS => self.jobs.map(|jobs| jobs.to_string()),
      _ => None,
    }
  }

  /// Resolve against the current directory: flags, then environment, then defaults.
  pub fn resolve(&self) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Config::from_lookup(&cwd, |name| self.lookup(name).or_else(|| std::env::var(name).ok()))
      .context("Invalid configuration")
  }
}

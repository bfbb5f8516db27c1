//! Build driver.
//!
//! Bootstraps b2 for the requested libraries, materializes the header tree,
//! then runs two sequential b2 invocations with disjoint configurations:
//!
//! - device (`armv6 armv7 armv7s`): staged and installed into the prefix
//! - simulator (`i386`): staged only
//!
//! Each invocation is checked; a failed build aborts the run immediately
//! instead of leaving the archive merger to discover missing archives.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::platform::Platform;
use crate::tool::{Invocation, ToolError, ToolRunner};
use crate::util::fs::copy_tree;

#[derive(Debug, Error)]
pub enum DriverError {
  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error("failed to stage headers into {}: {source}", path.display())]
  StageHeaders {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// `./bootstrap.sh --with-libraries=a,b,c`
pub fn bootstrap_invocation(config: &Config) -> Invocation {
  let checkout = config.checkout_dir();
  let mut invocation = Invocation::new(checkout.join("bootstrap.sh")).current_dir(&checkout);
  if !config.libraries.is_empty() {
    let libs: Vec<&str> = config.libraries.iter().map(|l| l.as_str()).collect();
    invocation = invocation.arg(format!("--with-libraries={}", libs.join(",")));
  }
  invocation.streaming()
}

/// `./b2 headers`
pub fn headers_invocation(config: &Config) -> Invocation {
  let checkout = config.checkout_dir();
  Invocation::new(checkout.join("b2"))
    .current_dir(&checkout)
    .arg("headers")
    .streaming()
}

/// b2 invocation that builds every slice of one platform.
///
/// The device build also installs headers into the prefix.
pub fn platform_invocation(config: &Config, platform: Platform) -> Invocation {
  let checkout = config.checkout_dir();
  let build_dir = platform.build_dir_name();
  let sdk = &config.sdk_version;

  let mut invocation = Invocation::new(checkout.join("b2"))
    .current_dir(&checkout)
    .arg(format!("-j{}", config.jobs))
    .arg(format!("--build-dir={}", build_dir))
    .arg(format!("--stagedir={}/stage", build_dir));

  if platform == Platform::Device {
    invocation = invocation.arg(format!("--prefix={}", config.prefix_dir.display()));
  }

  invocation = invocation
    .arg(format!("toolset=darwin-{}", platform.toolset_version(sdk)))
    .arg(format!("architecture={}", platform.build_architecture()))
    .arg("target-os=iphone")
    .arg(format!("macosx-version={}-{}", platform.as_str(), sdk));

  if platform == Platform::Device {
    invocation = invocation.arg("define=_LITTLE_ENDIAN");
  }

  invocation = invocation.arg("link=static").arg("stage");
  if platform == Platform::Device {
    invocation = invocation.arg("install");
  }

  invocation.streaming()
}

/// Run the full native build.
pub async fn build_all<R: ToolRunner>(config: &Config, runner: &R) -> Result<(), DriverError> {
  info!(libraries = config.libraries.len(), "bootstrapping b2");
  runner.run(&bootstrap_invocation(config)).await?;
  runner.run(&headers_invocation(config)).await?;

  if config.libraries.is_empty() {
    return stage_headers_only(config);
  }

  for platform in Platform::ALL {
    info!(platform = %platform, archs = ?platform.archs(), "building");
    runner.run(&platform_invocation(config, platform)).await?;
  }
  Ok(())
}

/// With nothing to compile, install just the header tree into the prefix.
fn stage_headers_only(config: &Config) -> Result<(), DriverError> {
  let dest = config.paths().prefix_headers();
  let src = config.checkout_dir().join("boost");
  let copied = copy_tree(&src, &dest).map_err(|source| DriverError::StageHeaders {
    path: dest.clone(),
    source,
  })?;
  info!(files = copied, "no libraries requested, staged headers only");
  Ok(())
}

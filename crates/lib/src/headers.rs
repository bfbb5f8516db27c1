//! Header patching.
//!
//! A few system headers Boost includes are absent from the device SDK but
//! present in the simulator SDK. They are copied into the checkout root, which
//! is on the include path of both builds.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::consts::MISSING_SDK_HEADERS;
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum HeaderError {
  #[error("header '{name}' not found in simulator SDK at {}", path.display())]
  MissingSdkHeader { name: String, path: PathBuf },

  #[error("failed to copy header to {}: {source}", path.display())]
  Copy {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Copy the missing device headers from the simulator SDK into the checkout.
///
/// Returns the paths of the copied headers.
pub fn patch_missing_headers(config: &Config) -> Result<Vec<PathBuf>, HeaderError> {
  let paths = config.paths();
  let sdk_include = paths.sdk_include_dir(Platform::Simulator);
  let checkout = paths.checkout();
  let mut copied = Vec::with_capacity(MISSING_SDK_HEADERS.len());

  for name in MISSING_SDK_HEADERS {
    let source = sdk_include.join(name);
    if !source.is_file() {
      return Err(HeaderError::MissingSdkHeader {
        name: name.to_string(),
        path: source,
      });
    }

    let dest = checkout.join(name);
    fs::copy(&source, &dest).map_err(|e| HeaderError::Copy {
      path: dest.clone(),
      source: e,
    })?;
    debug!(from = %source.display(), to = %dest.display(), "copied header");
    copied.push(dest);
  }

  info!(count = copied.len(), "patched missing SDK headers");
  Ok(copied)
}

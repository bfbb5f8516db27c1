//! Implementation of the `boostframe verify` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use boostframe_lib::framework::verify_bundle;

use super::ConfigArgs;
use crate::output::{print_json, print_stat, print_success, print_warning};

/// Verify `bundle`, or the configured bundle location when none is given.
pub fn cmd_verify(bundle: Option<PathBuf>, args: &ConfigArgs, json: bool) -> Result<()> {
  let bundle = match bundle {
    Some(path) => path,
    None => args.resolve()?.paths().bundle(),
  };
  let summary = verify_bundle(&bundle).with_context(|| format!("Invalid bundle {}", bundle.display()))?;

  if json {
    return print_json(&summary);
  }

  print_success(&format!("Valid framework: {}", summary.path.display()));
  print_stat("Version", &summary.version);
  print_stat("Header files", &summary.header_files.to_string());
  print_stat("Digest", &summary.digest.0);
  if !summary.has_binary {
    print_warning("bundle carries no binary");
  }
  Ok(())
}

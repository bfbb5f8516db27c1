use anyhow::{Context, Result};

use boostframe_lib::pipeline;

use super::ConfigArgs;
use crate::output::{print_info, print_success};

pub fn cmd_clean(args: &ConfigArgs) -> Result<()> {
  let config = args.resolve()?;
  let removed = pipeline::clean(&config).context("Clean failed")?;

  if removed.is_empty() {
    print_info("Nothing to clean");
  } else {
    for dir in &removed {
      print_success(&format!("Removed {}", dir.display()));
    }
  }
  Ok(())
}

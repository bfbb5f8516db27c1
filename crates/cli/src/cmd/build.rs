//! Implementation of the `boostframe build` command.

use anyhow::{Context, Result};
use tracing::debug;

use boostframe_lib::pipeline;
use boostframe_lib::tool::SystemRunner;

use super::ConfigArgs;
use crate::output::{format_elapsed, print_info, print_json, print_stat, print_success, symbols, truncate_hash};

/// Run the full pipeline and summarize the result.
pub fn cmd_build(args: &ConfigArgs, json: bool) -> Result<()> {
  let config = args.resolve()?;
  debug!(?config, "resolved configuration");
  if !json {
    let libs: Vec<&str> = config.libraries.iter().map(|l| l.as_str()).collect();
    print_info(&format!("Building boost.framework for iOS SDK {}", config.sdk_version));
    print_stat("Libraries", &display_list(&libs));
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(pipeline::run(&config, &SystemRunner))
    .context("Build failed")?;

  if json {
    return print_json(&report);
  }

  println!();
  print_success(&format!("Framework complete: {}", report.bundle.display()));
  print_stat("Boost", &report.source.version);
  print_stat("Merged archives", &report.merged_archives.len().to_string());
  let archs: Vec<&str> = report.consolidated_archives.iter().map(|(arch, _)| arch.as_str()).collect();
  print_stat("Architectures", &display_list(&archs));
  print_stat("Digest", truncate_hash(&report.digest.0));
  print_stat("Elapsed", &format_elapsed(report.elapsed));

  if !report.has_binary {
    println!("  {} headers only, no libraries were built", symbols::ARROW);
  }
  Ok(())
}

fn display_list(items: &[&str]) -> String {
  if items.is_empty() {
    "(none)".to_string()
  } else {
    items.join(" ")
  }
}

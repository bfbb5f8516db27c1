//! Implementation of the `boostframe config` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use boostframe_lib::config::Config;

use super::ConfigArgs;
use crate::output::{print_json, print_stat, print_success};

#[derive(Serialize)]
struct ConfigOutput<'a> {
  config: &'a Config,
  checkout: PathBuf,
  user_config_jam: PathBuf,
  universal_archive: PathBuf,
  bundle: PathBuf,
}

pub fn cmd_config(args: &ConfigArgs, json: bool) -> Result<()> {
  let config = args.resolve()?;
  let paths = config.paths();

  if json {
    return print_json(&ConfigOutput {
      config: &config,
      checkout: paths.checkout(),
      user_config_jam: paths.user_config_jam(),
      universal_archive: paths.universal_archive(),
      bundle: paths.bundle(),
    });
  }

  let libs: Vec<&str> = config.libraries.iter().map(|l| l.as_str()).collect();
  print_success("Resolved configuration");
  print_stat("Libraries", &libs.join(" "));
  print_stat("SDK version", &config.sdk_version);
  print_stat("Xcode root", &config.xcode_root.display().to_string());
  print_stat("Compiler", &config.compiler);
  print_stat("Extra CPPFLAGS", &config.extra_cppflags);
  print_stat("Repository", &config.repo_url);
  print_stat("Jobs", &config.jobs.to_string());
  println!();
  print_stat("Checkout", &paths.checkout().display().to_string());
  print_stat("Build", &config.build_dir.display().to_string());
  print_stat("Prefix", &config.prefix_dir.display().to_string());
  print_stat("Bundle", &paths.bundle().display().to_string());
  Ok(())
}

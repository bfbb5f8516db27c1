mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boostframe_lib::pipeline::PipelineError;

use cmd::ConfigArgs;
use output::print_error;

/// Build Boost for iOS and package it as a universal boost.framework
#[derive(Parser)]
#[command(name = "boostframe")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch, build and package the framework
  Build {
    #[command(flatten)]
    config: ConfigArgs,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Remove the build, prefix and framework directories
  Clean {
    #[command(flatten)]
    config: ConfigArgs,
  },

  /// Show the resolved configuration and artifact locations
  Config {
    #[command(flatten)]
    config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Check a framework bundle's layout and print its digest
  Verify {
    /// Bundle to check (default: the configured framework directory's bundle)
    bundle: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Build { config, json } => cmd::cmd_build(&config, json),
    Commands::Clean { config } => cmd::cmd_clean(&config),
    Commands::Config { config, json } => cmd::cmd_config(&config, json),
    Commands::Verify { bundle, config, json } => cmd::cmd_verify(bundle, &config, json),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("Aborted: {:#}", err));
      ExitCode::from(exit_code(&err))
    }
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

/// A failed external tool's own exit code, otherwise 1.
fn exit_code(err: &anyhow::Error) -> u8 {
  err
    .chain()
    .find_map(|cause| cause.downcast_ref::<PipelineError>())
    .and_then(PipelineError::exit_code)
    .and_then(|code| u8::try_from(code).ok())
    .filter(|code| *code != 0)
    .unwrap_or(1)
}

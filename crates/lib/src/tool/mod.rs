//! External tool invocation.
//!
//! Every external program the pipeline needs (`git`, `bootstrap.sh`, `b2`,
//! `lipo`, `ar`) is described as an [`Invocation`] and executed through a
//! [`ToolRunner`]. [`SystemRunner`] spawns real processes; tests substitute a
//! runner that simulates the tools on the filesystem.

mod system;

pub use system::SystemRunner;

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
  /// The program could not be started.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("{program} failed with {}", describe_code(.code))]
  Failed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },
}

impl ToolError {
  /// Exit code of the failed tool, if it exited normally.
  pub fn exit_code(&self) -> Option<i32> {
    match self {
      ToolError::Failed { code, .. } => *code,
      ToolError::Spawn { .. } => None,
    }
  }
}

fn describe_code(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "no exit code (terminated by signal)".to_string(),
  }
}

/// Whether the tool's own output is captured or forwarded to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
  /// Captured and returned in [`ToolOutput::stdout`].
  #[default]
  Capture,
  /// Forwarded to stderr as it is produced; used for long-running builds.
  Stream,
}

/// One external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: PathBuf,
  pub args: Vec<OsString>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
  pub output: OutputMode,
}

impl Invocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: BTreeMap::new(),
      output: OutputMode::Capture,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn streaming(mut self) -> Self {
    self.output = OutputMode::Stream;
    self
  }

  /// File name of the program, used in logs and errors.
  pub fn program_name(&self) -> String {
    self
      .program
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
  }

  /// Arguments as UTF-8 strings (lossy).
  pub fn args_lossy(&self) -> Vec<String> {
    self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      write!(f, " {}", arg.to_string_lossy())?;
    }
    Ok(())
  }
}

/// Captured result of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
  /// Trimmed stdout; empty when output was streamed.
  pub stdout: String,
}

/// Executes external programs.
///
/// A non-zero exit is always reported as [`ToolError::Failed`].
pub trait ToolRunner {
  fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ToolOutput, ToolError>>;
}

//! Runs invocations as real child processes.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use super::{Invocation, OutputMode, ToolError, ToolOutput, ToolRunner};

/// Spawns each invocation with `tokio::process` and waits for it to exit.
///
/// The child inherits the caller's environment, with the invocation's
/// variables layered on top. Captured stdout is returned trimmed; stderr is
/// logged at debug level and attached to [`ToolError::Failed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
  pub fn new() -> Self {
    Self
  }
}

impl ToolRunner for SystemRunner {
  async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
    let program = invocation.program_name();
    info!(cmd = %invocation, "running");

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).stdin(Stdio::null());

    if let Some(cwd) = &invocation.cwd {
      command.current_dir(cwd);
    }
    for (key, value) in &invocation.env {
      command.env(key, value);
    }

    if invocation.output == OutputMode::Stream {
      // Keep our own stdout clean for machine-readable reports.
      command.stdout(Stdio::from(std::io::stderr())).stderr(Stdio::inherit());
      let status = command.status().await.map_err(|source| ToolError::Spawn {
        program: program.clone(),
        source,
      })?;

      if !status.success() {
        return Err(ToolError::Failed {
          program,
          code: status.code(),
          stderr: String::new(),
        });
      }
      return Ok(ToolOutput::default());
    }

    debug!(cwd = ?invocation.cwd, "spawning process");
    let output = command.output().await.map_err(|source| ToolError::Spawn {
      program: program.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }

    if !output.status.success() {
      if !stdout.is_empty() {
        debug!(stdout = %stdout, "command stdout");
      }
      return Err(ToolError::Failed {
        program,
        code: output.status.code(),
        stderr,
      });
    }

    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command output");
    }

    Ok(ToolOutput { stdout })
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn sh(script: &str) -> Invocation {
    Invocation::new("/bin/sh").arg("-c").arg(script)
  }

  #[tokio::test]
  async fn captures_trimmed_stdout() {
    let output = SystemRunner::new().run(&sh("echo hello")).await.unwrap();
    assert_eq!(output.stdout, "hello");
  }

  #[tokio::test]
  async fn passes_environment() {
    let inv = sh("echo \"$ZERO_AR_DATE\"").env("ZERO_AR_DATE", "1");
    let output = SystemRunner::new().run(&inv).await.unwrap();
    assert_eq!(output.stdout, "1");
  }

  #[tokio::test]
  async fn runs_in_working_directory() {
    let temp = TempDir::new().unwrap();
    SystemRunner::new()
      .run(&sh("/usr/bin/touch cwd_marker").current_dir(temp.path()))
      .await
      .unwrap();

    assert!(temp.path().join("cwd_marker").exists());
  }

  #[tokio::test]
  async fn non_zero_exit_is_an_error() {
    let result = SystemRunner::new().run(&sh("echo oops >&2; exit 3")).await;

    match result {
      Err(ToolError::Failed { program, code, stderr }) => {
        assert_eq!(program, "sh");
        assert_eq!(code, Some(3));
        assert_eq!(stderr, "oops");
      }
      other => panic!("expected failure, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn streamed_failure_keeps_exit_code() {
    let result = SystemRunner::new().run(&sh("exit 7").streaming()).await;
    assert!(matches!(result, Err(ToolError::Failed { code: Some(7), .. })));
  }

  #[tokio::test]
  async fn missing_program_is_a_spawn_error() {
    let result = SystemRunner::new()
      .run(&Invocation::new("/nonexistent/boostframe-tool"))
      .await;
    assert!(matches!(result, Err(ToolError::Spawn { .. })));
  }
}

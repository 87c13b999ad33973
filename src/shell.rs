use log::debug;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::errors::CommandError;

// @module: External command execution

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8)
    pub stdout: String,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Render a command as a single line for logs and errors
pub fn render<S: AsRef<str>>(command: &[S]) -> String {
    command
        .iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command in `dir` without checking its exit status
///
/// Only a failure to start the process is an error; callers that use the
/// exit code as a signal (e.g. `git diff --quiet`) inspect `code` themselves.
pub async fn run_unchecked<S: AsRef<str>>(dir: &Path, command: &[S]) -> Result<CommandOutput, CommandError> {
    let (program, args) = command.split_first().ok_or(CommandError::Empty)?;

    let output = Command::new(program.as_ref())
        .args(args.iter().map(|arg| arg.as_ref()))
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| CommandError::Spawn {
            command: render(command),
            message: e.to_string(),
        })?;

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a command in `dir`, failing on a non-zero exit status
///
/// Captured stdout is written to the debug log.
pub async fn run<S: AsRef<str>>(dir: &Path, command: &[S]) -> Result<CommandOutput, CommandError> {
    let output = run_quiet(dir, command).await?;
    let stdout = output.stdout.trim_end();
    if !stdout.is_empty() {
        debug!("{}", stdout);
    }
    Ok(output)
}

/// Same as [`run`] but never logs stdout (used for blob retrieval)
pub async fn run_quiet<S: AsRef<str>>(dir: &Path, command: &[S]) -> Result<CommandOutput, CommandError> {
    debug!("$ {}", render(command));
    let output = run_unchecked(dir, command).await?;

    if !output.success() {
        return Err(CommandError::Failed {
            command: render(command),
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr.trim_end().to_string(),
        });
    }

    Ok(output)
}

/// Run a sequence of commands, stopping at the first failure
pub async fn run_all<S: AsRef<str>>(dir: &Path, commands: &[Vec<S>]) -> Result<(), CommandError> {
    for command in commands {
        run(dir, command).await?;
    }
    Ok(())
}

//! Child process execution for the Java toolchain

#[cfg(test)]
mod tests;

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{JavaTestError, Result};

/// Captured result of a finished child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub program: String,
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    pub command_line: String,
}

impl CommandOutput {
    #[inline]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Turn a non-zero exit into [`JavaTestError::CommandFailed`]
    #[inline]
    pub fn into_success(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    #[inline]
    pub fn into_error(self) -> JavaTestError {
        JavaTestError::CommandFailed {
            program: self.program,
            code: self.code,
            stderr: self.stderr,
        }
    }
}

/// Render a command line for logs and tool results
#[inline]
pub fn format_command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run `program` to completion, capturing stdout and stderr.
///
/// Both pipes are drained concurrently so a chatty compiler cannot block on a
/// full stderr buffer. The child is killed if `timeout` elapses.
#[inline]
pub async fn run_command(program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
    let command_line = format_command_line(program, args);
    debug!("Running: {}", command_line);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| JavaTestError::Toolchain(format!("Failed to start '{}': {}", program, e)))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            warn!("Command timed out after {:?}: {}", timeout, command_line);
            return Ok(CommandOutput {
                program: program.to_string(),
                code: -1,
                stdout: String::new(),
                stderr: format!("Command timed out after {} seconds", timeout.as_secs()),
                command_line,
            });
        }
    };

    let code = output.status.code().unwrap_or(-1);
    if code == 0 {
        debug!("{} exited successfully", program);
    } else {
        warn!("{} exited with code {}", program, code);
    }

    Ok(CommandOutput {
        program: program.to_string(),
        code,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        command_line,
    })
}

//! [`CommandRunner`] implementation backed by child processes.

use crate::traits::{CommandRunner, Completion, Invocation};
use log::debug;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Runs programs as blocking child processes.
///
/// Captured invocations get piped stdout/stderr; all others inherit the
/// caller's streams so daemonising programs (`picom -b`) do not keep a pipe
/// open.
#[derive(Debug, Default)]
pub struct ProcessRunner;

/// Errors that can occur when spawning a child process.
#[derive(Debug, thiserror::Error)]
#[error("process error: {0}")]
pub struct ProcessError(String);

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    type Error = ProcessError;

    fn execute(&self, invocation: &Invocation) -> Result<Completion, Self::Error> {
        debug!("running {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);

        if !invocation.capture {
            let status = command
                .status()
                .map_err(|e| ProcessError(format!("spawn {}: {}", invocation.program, e)))?;
            return Ok(Completion {
                status: status.code(),
                ..Completion::default()
            });
        }

        command
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| ProcessError(format!("spawn {}: {}", invocation.program, e)))?;

        if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| ProcessError(format!("write stdin: {}", e)))?;
            // Dropping stdin closes the pipe so the child sees EOF.
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ProcessError(format!("wait: {}", e)))?;

        Ok(Completion {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

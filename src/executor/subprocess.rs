//! Subprocess execution.
//!
//! Runs external commands with:
//! - No shell interpretation (direct exec)
//! - Configurable timeouts
//! - Captured or inherited stdout/stderr

use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::CliError;

/// Result of a subprocess execution.
#[derive(Debug, Clone)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string. Empty when output was inherited.
    pub stdout: String,
    /// Captured stderr as a string. Empty when output was inherited.
    pub stderr: String,
}

impl SubprocessResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Builder for subprocess execution.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    inherit_io: bool,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            timeout: Some(Duration::from_secs(60)),
            inherit_io: false,
        }
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Set the timeout for the command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Remove the timeout; the command may run indefinitely.
    ///
    /// Used for interactive macros (setup wizard, rails console) where a
    /// deadline makes no sense.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Attach the child to the parent's stdout/stderr instead of capturing.
    pub fn inherit_io(mut self) -> Self {
        self.inherit_io = true;
        self
    }

    /// Execute the command and wait for completion with timeout enforcement.
    ///
    /// If the process exceeds the configured timeout, it is killed and a
    /// timeout error is returned.
    pub fn run(self) -> Result<SubprocessResult, CliError> {
        debug!(
            program = %self.program,
            args = ?self.args,
            timeout_secs = self.timeout.map(|t| t.as_secs()),
            "Executing subprocess"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if self.inherit_io {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        }
        cmd.stdin(if self.inherit_io {
            Stdio::inherit()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(|e| {
            CliError::execution(format!("Failed to spawn {}: {}", self.program, e))
        })?;

        // Poll for completion with timeout enforcement.
        let start = Instant::now();
        let poll_interval = Duration::from_millis(100);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let result = if self.inherit_io {
                        SubprocessResult {
                            success: status.success(),
                            exit_code: status.code(),
                            stdout: String::new(),
                            stderr: String::new(),
                        }
                    } else {
                        let output = child.wait_with_output().map_err(|e| {
                            CliError::execution(format!(
                                "Failed to get output from {}: {}",
                                self.program, e
                            ))
                        })?;
                        SubprocessResult::from_output(output)
                    };
                    debug!(
                        success = result.success,
                        exit_code = ?result.exit_code,
                        duration_ms = start.elapsed().as_millis(),
                        "Subprocess completed"
                    );
                    return Ok(result);
                }
                Ok(None) => {
                    if let Some(timeout) = self.timeout {
                        if start.elapsed() > timeout {
                            warn!(
                                program = %self.program,
                                timeout_secs = timeout.as_secs(),
                                "Process timed out, killing"
                            );
                            if let Err(e) = child.kill() {
                                warn!(error = %e, "Failed to kill timed-out process");
                            }
                            // Reap the zombie process.
                            let _ = child.wait();
                            return Err(CliError::Timeout {
                                timeout_secs: timeout.as_secs(),
                            });
                        }
                    }
                    std::thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(CliError::execution(format!(
                        "Failed to check process status: {}",
                        e
                    )));
                }
            }
        }
    }
}

/// Run a command with the given arguments and timeout, capturing output.
pub fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<SubprocessResult, CliError> {
    SubprocessBuilder::new(program)
        .args(args.iter().copied())
        .timeout(timeout)
        .run()
}

//! Remote command execution over SSH.
//!
//! This is the single remote-execution primitive every multi-node operation
//! builds on: non-interactive, key-based, short connect timeout, host-key
//! verification disabled (nodes are reinstalled freely inside the cluster).

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::config::Settings;
use crate::error::CliResult;
use crate::executor::{SubprocessBuilder, SubprocessResult};

/// Executes a shell command on a named cluster node.
pub trait RemoteExecutor {
    /// Run `command` on `node`, inheriting output. Returns process success.
    fn run(&self, node: &str, command: &str) -> CliResult<bool>;

    /// Run `command` on `node` with captured output.
    fn capture(&self, node: &str, command: &str) -> CliResult<SubprocessResult>;
}

/// Production SSH executor (`root@<node>` with a fixed private key).
pub struct SshExecutor {
    key_path: PathBuf,
    connect_timeout: u64,
    command_timeout: Duration,
}

impl SshExecutor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            key_path: settings.ssh.key_path.clone(),
            connect_timeout: settings.ssh.connect_timeout_seconds,
            command_timeout: Duration::from_secs(settings.ssh.command_timeout_seconds),
        }
    }

    fn builder(&self, node: &str, command: &str) -> SubprocessBuilder {
        SubprocessBuilder::new("ssh")
            .arg("-o")
            .arg(&format!("ConnectTimeout={}", self.connect_timeout))
            .arg("-o")
            .arg("LogLevel=quiet")
            .arg("-o")
            .arg("UserKnownHostsFile=/dev/null")
            .arg("-o")
            .arg("PasswordAuthentication=no")
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-i")
            .arg(&self.key_path.to_string_lossy())
            .arg(&format!("root@{}", node))
            .arg(command)
            .timeout(self.command_timeout)
    }
}

impl RemoteExecutor for SshExecutor {
    fn run(&self, node: &str, command: &str) -> CliResult<bool> {
        debug!(node, command, "running remote command");
        let result = self.builder(node, command).inherit_io().run()?;
        Ok(result.success)
    }

    fn capture(&self, node: &str, command: &str) -> CliResult<SubprocessResult> {
        debug!(node, command, "capturing remote command");
        self.builder(node, command).run()
    }
}

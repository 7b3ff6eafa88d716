//! Command handlers, one module per CLI noun.

pub mod check;
pub mod logstash;
pub mod memcached;
pub mod node;
pub mod rails;
pub mod service;
pub mod setup;
pub mod zookeeper;

use crate::cluster::{ClusterDirectory, RemoteExecutor};
use crate::config::Settings;
use crate::error::{CliError, CliResult};

/// Capabilities handed to every command handler.
///
/// Commands never reach for ambient globals; membership, records and remote
/// execution all come through here so tests can swap in mocks.
pub struct CommandContext<'a> {
    pub settings: &'a Settings,
    pub directory: &'a dyn ClusterDirectory,
    pub remote: &'a dyn RemoteExecutor,
    /// Short hostname of the node this invocation runs on.
    pub local_host: String,
}

/// Turn an aggregated failure count into the command result. Batches run to
/// completion and only then report.
pub(crate) fn finish_batch(failures: usize) -> CliResult<()> {
    if failures == 0 {
        Ok(())
    } else {
        Err(CliError::execution(format!(
            "{} operation(s) failed",
            failures
        )))
    }
}

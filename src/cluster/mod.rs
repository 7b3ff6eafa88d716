//! Cluster membership, node records and remote execution.

mod directory;
mod membership;
mod node;
mod remote;

pub use directory::{resolve_targets, ClusterDirectory};
pub use membership::AgentDirectory;
pub use node::{Node, RoleRecord, MANAGER_ROLE};
pub use remote::{RemoteExecutor, SshExecutor};

/// Short local hostname (first dotted component), matching what the
/// membership agent reports for this node.
pub fn local_hostname() -> String {
    let raw = std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string());
    raw.split('.').next().unwrap_or("localhost").to_string()
}

//! Guard rails for mandatory services.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::cluster::ClusterDirectory;
use crate::error::{CliError, CliResult, PolicyKind};
use crate::executor::run_command;

/// Services that refuse a disable when the cluster would drop below two
/// enabled nodes.
pub const PROTECTED_SERVICES: &[&str] = &["s3", "redis", "postgresql"];

pub fn is_protected(service: &str) -> bool {
    PROTECTED_SERVICES.contains(&service)
}

/// Count cluster nodes with `service` enabled. The role-level override wins
/// when present; otherwise the node's own service map decides. Nodes whose
/// record cannot be loaded are skipped.
pub fn enabled_node_count(directory: &dyn ClusterDirectory, service: &str) -> CliResult<usize> {
    let mut enabled = 0;
    for name in directory.members()? {
        let node = match directory.node(&name) {
            Ok(node) => node,
            Err(_) => continue,
        };
        let flag = match directory.role(&name) {
            Ok(role) => role
                .service_override(service)
                .or_else(|| node.services.get(service).copied()),
            Err(_) => node.services.get(service).copied(),
        };
        if flag.unwrap_or(false) {
            enabled += 1;
        }
    }
    debug!(service, enabled, "protected service redundancy count");
    Ok(enabled)
}

/// Refuse to disable a protected service below the redundancy floor.
pub fn ensure_redundancy(directory: &dyn ClusterDirectory, service: &str) -> CliResult<()> {
    if !is_protected(service) {
        return Ok(());
    }
    let enabled_nodes = enabled_node_count(directory, service)?;
    if enabled_nodes <= 1 {
        return Err(CliError::PolicyViolation {
            kind: PolicyKind::RedundancyFloor {
                service: service.to_string(),
                enabled_nodes,
            },
        });
    }
    Ok(())
}

/// Whether a PostgreSQL instance has ever been initialized here.
pub fn postgres_present(data_dir: &Path) -> bool {
    data_dir.is_dir()
}

/// Whether the local PostgreSQL instance is the primary. Unable-to-tell
/// degrades to `false` so a broken instance can still be stopped.
pub fn postgres_is_primary() -> bool {
    match run_command(
        "psql",
        &["-U", "postgres", "-tAc", "SELECT pg_is_in_recovery()"],
        Duration::from_secs(10),
    ) {
        Ok(result) if result.success => result.stdout.trim() == "f",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_set() {
        assert!(is_protected("s3"));
        assert!(is_protected("redis"));
        assert!(is_protected("postgresql"));
        assert!(!is_protected("kafka"));
    }

    #[test]
    fn test_postgres_present() {
        assert!(!postgres_present(Path::new("/nonexistent/pgsql/data")));
    }
}

//! The cluster directory abstraction.

use tracing::warn;

use crate::error::{CliError, CliResult, NotFoundKind};

use super::node::{Node, RoleRecord};

/// Access to cluster membership and node/role records.
///
/// Commands receive this as an injected capability so multi-node logic can
/// be exercised against a mock in tests.
pub trait ClusterDirectory {
    /// Names of the current cluster members, in the order the membership
    /// agent reports them.
    fn members(&self) -> CliResult<Vec<String>>;

    /// Load a node record.
    fn node(&self, name: &str) -> CliResult<Node>;

    /// Persist a patched node record.
    fn save_node(&self, node: &Node) -> CliResult<()>;

    /// Load a role record.
    fn role(&self, name: &str) -> CliResult<RoleRecord>;

    /// Persist a patched role record.
    fn save_role(&self, role: &RoleRecord) -> CliResult<()>;
}

/// Resolve a `<node|all>` target into the list of nodes to act on.
///
/// `all` expands to every member in membership order. A concrete name must
/// be a current member. When the membership agent itself is unreachable the
/// operation degrades to the local host, but only if the local host is what
/// was asked for; any other name is a hard error rather than being
/// reinterpreted.
pub fn resolve_targets(
    directory: &dyn ClusterDirectory,
    target: &str,
    local_host: &str,
) -> CliResult<Vec<String>> {
    if target.eq_ignore_ascii_case("all") {
        return directory.members();
    }
    match directory.members() {
        Ok(members) => {
            if members.iter().any(|m| m == target) {
                Ok(vec![target.to_string()])
            } else {
                Err(CliError::NotFound {
                    kind: NotFoundKind::Node {
                        name: target.to_string(),
                    },
                })
            }
        }
        Err(err @ CliError::Unreachable { .. }) => {
            if target == local_host {
                warn!("membership agent unreachable, operating on the local host only");
                Ok(vec![local_host.to_string()])
            } else {
                Err(err)
            }
        }
        Err(err) => Err(err),
    }
}

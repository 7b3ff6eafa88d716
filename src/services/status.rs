//! Service status classification shared by the local and cluster-wide
//! status tables.

/// Display state of a service on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
    External,
    Error,
    Unknown,
}

impl ServiceState {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceState::Running => "running",
            ServiceState::Stopped => "not running",
            ServiceState::External => "external",
            ServiceState::Error => "not running!!",
            ServiceState::Unknown => "unknown",
        }
    }
}

/// Classify a unit on the local node from its systemctl activation state,
/// its enablement in services.json and the external-services markers.
///
/// An inactive unit that is expected to be enabled is an error; an inactive
/// disabled one is merely stopped.
pub fn classify_local(active_state: &str, enabled: bool, external: bool) -> ServiceState {
    if active_state == "active" {
        ServiceState::Running
    } else if !enabled {
        ServiceState::Stopped
    } else if external {
        ServiceState::External
    } else {
        ServiceState::Error
    }
}

/// Classify a unit on a remote node from the `is-active`/`is-enabled` pair
/// reported by the batched SSH probe.
pub fn classify_remote(active_state: &str, enabled_state: &str) -> ServiceState {
    match active_state {
        "active" => ServiceState::Running,
        "inactive" | "failed" => {
            if enabled_state == "enabled" {
                ServiceState::Error
            } else {
                ServiceState::Stopped
            }
        }
        _ => ServiceState::Unknown,
    }
}

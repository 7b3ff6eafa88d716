//! Service-state domain logic: unit groups, persisted state, guard rails,
//! status classification.

mod groups;
mod protected;
mod state;
mod status;

pub use groups::{logicals_for_unit, peers_in_group, unit_known};
pub use protected::{
    enabled_node_count, ensure_redundancy, is_protected, postgres_is_primary, postgres_present,
    PROTECTED_SERVICES,
};
pub use state::{is_external, read_external_services, ServicesFile};
pub use status::{classify_local, classify_remote, ServiceState};

//! Typed node and role records.
//!
//! Node and role documents are owned by the configuration-management
//! backend; this tool decodes the attributes it consumes into typed fields
//! at the boundary and patches the raw JSON document on writes, so content
//! it does not model survives a save untouched.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{CliError, CliResult};

/// Role name that marks a node as a manager.
pub const MANAGER_ROLE: &str = "manager";

#[derive(Debug, Deserialize)]
struct NodeDoc {
    name: String,
    #[serde(default)]
    run_list: Vec<String>,
    #[serde(default)]
    redborder: RedborderAttrs,
    #[serde(default)]
    uptime: Option<String>,
    #[serde(default)]
    uptime_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RedborderAttrs {
    #[serde(default)]
    services: BTreeMap<String, bool>,
    #[serde(default, rename = "systemdservices")]
    systemd_services: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    managers_per_services: BTreeMap<String, Value>,
}

/// A cluster node record.
#[derive(Debug, Clone)]
pub struct Node {
    raw: Value,
    pub name: String,
    pub roles: Vec<String>,
    /// Logical service name -> enabled.
    pub services: BTreeMap<String, bool>,
    /// Logical service name -> systemd unit name(s). Services sharing the
    /// same unit vector form a systemd unit group and toggle together.
    pub systemd_services: BTreeMap<String, Vec<String>>,
    /// Logical services expected to run on managers (keys only are used).
    pub manager_services: Vec<String>,
    pub uptime: Option<String>,
    pub uptime_seconds: Option<u64>,
}

impl Node {
    /// Decode a node record from its raw JSON document.
    pub fn from_document(raw: Value) -> CliResult<Self> {
        let doc: NodeDoc = serde_json::from_value(raw.clone()).map_err(|e| CliError::Config {
            message: format!("invalid node document: {}", e),
        })?;
        let roles = doc
            .run_list
            .iter()
            .filter_map(|entry| {
                entry
                    .strip_prefix("role[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(|role| role.to_string())
            })
            .collect();
        let mut manager_services: Vec<String> =
            doc.redborder.managers_per_services.keys().cloned().collect();
        manager_services.sort();
        Ok(Self {
            raw,
            name: doc.name,
            roles,
            services: doc.redborder.services,
            systemd_services: doc.redborder.systemd_services,
            manager_services,
            uptime: doc.uptime,
            uptime_seconds: doc.uptime_seconds,
        })
    }

    pub fn is_manager(&self) -> bool {
        self.roles.iter().any(|r| r == MANAGER_ROLE)
    }

    /// Set a service enablement override on the node record.
    pub fn set_service_override(&mut self, service: &str, enabled: bool) {
        self.services.insert(service.to_string(), enabled);
        ensure_object(&mut self.raw, &["override", "redborder", "services"])
            .insert(service.to_string(), json!(enabled));
    }

    /// Set a service enablement in the node's local `overwrite` shadow map.
    /// On manager nodes this mirrors the role-level policy so the central
    /// value can be locally shadowed.
    pub fn set_service_overwrite(&mut self, service: &str, enabled: bool) {
        ensure_object(
            &mut self.raw,
            &["override", "redborder", "services", "overwrite"],
        )
        .insert(service.to_string(), json!(enabled));
    }

    /// The raw JSON document, with any patches applied.
    pub fn document(&self) -> &Value {
        &self.raw
    }
}

/// A role record holding centrally distributed service policy.
#[derive(Debug, Clone)]
pub struct RoleRecord {
    raw: Value,
    pub name: String,
}

impl RoleRecord {
    pub fn from_document(raw: Value) -> CliResult<Self> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CliError::Config {
                message: "role document has no name".to_string(),
            })?
            .to_string();
        Ok(Self { raw, name })
    }

    /// The role-level override for a service, if one is set.
    pub fn service_override(&self, service: &str) -> Option<bool> {
        self.raw
            .get("override_attributes")?
            .get("redborder")?
            .get("services")?
            .get(service)?
            .as_bool()
    }

    /// Set the role-level override for a service.
    pub fn set_service(&mut self, service: &str, enabled: bool) {
        ensure_object(
            &mut self.raw,
            &["override_attributes", "redborder", "services"],
        )
        .insert(service.to_string(), json!(enabled));
    }

    pub fn document(&self) -> &Value {
        &self.raw
    }
}

/// Walk (creating as needed) a nested object path and return the innermost map.
fn ensure_object<'a>(
    value: &'a mut Value,
    path: &[&str],
) -> &'a mut serde_json::Map<String, Value> {
    let mut current = value;
    for key in path {
        if !current.is_object() {
            *current = json!({});
        }
        let map = current.as_object_mut().unwrap();
        current = map.entry(key.to_string()).or_insert_with(|| json!({}));
    }
    if !current.is_object() {
        *current = json!({});
    }
    current.as_object_mut().unwrap()
}

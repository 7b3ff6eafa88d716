//! Shared in-memory doubles for multi-node command tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use serde_json::{json, Value};

use rbcli::cluster::{ClusterDirectory, Node, RemoteExecutor, RoleRecord};
use rbcli::error::{CliError, CliResult, NotFoundKind};
use rbcli::executor::SubprocessResult;

/// In-memory cluster directory backed by raw JSON documents.
pub struct MockDirectory {
    pub members: Vec<String>,
    nodes: Mutex<BTreeMap<String, Value>>,
    roles: Mutex<BTreeMap<String, Value>>,
}

impl MockDirectory {
    pub fn new(members: &[&str]) -> Self {
        Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            nodes: Mutex::new(BTreeMap::new()),
            roles: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_node(self, name: &str, doc: Value) -> Self {
        self.nodes.lock().unwrap().insert(name.to_string(), doc);
        self
    }

    pub fn with_role(self, name: &str, doc: Value) -> Self {
        self.roles.lock().unwrap().insert(name.to_string(), doc);
        self
    }

    pub fn node_document(&self, name: &str) -> Option<Value> {
        self.nodes.lock().unwrap().get(name).cloned()
    }

    pub fn role_document(&self, name: &str) -> Option<Value> {
        self.roles.lock().unwrap().get(name).cloned()
    }
}

impl ClusterDirectory for MockDirectory {
    fn members(&self) -> CliResult<Vec<String>> {
        Ok(self.members.clone())
    }

    fn node(&self, name: &str) -> CliResult<Node> {
        let doc = self
            .nodes
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| CliError::NotFound {
                kind: NotFoundKind::Node {
                    name: name.to_string(),
                },
            })?;
        Node::from_document(doc)
    }

    fn save_node(&self, node: &Node) -> CliResult<()> {
        self.nodes
            .lock()
            .unwrap()
            .insert(node.name.clone(), node.document().clone());
        Ok(())
    }

    fn role(&self, name: &str) -> CliResult<RoleRecord> {
        let doc = self
            .roles
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| CliError::NotFound {
                kind: NotFoundKind::Node {
                    name: name.to_string(),
                },
            })?;
        RoleRecord::from_document(doc)
    }

    fn save_role(&self, role: &RoleRecord) -> CliResult<()> {
        self.roles
            .lock()
            .unwrap()
            .insert(role.name.clone(), role.document().clone());
        Ok(())
    }
}

/// Remote executor that records every call and fails on designated nodes.
#[derive(Default)]
pub struct MockRemote {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail_nodes: BTreeSet<String>,
}

impl MockRemote {
    pub fn failing_on(nodes: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_nodes: nodes.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteExecutor for MockRemote {
    fn run(&self, node: &str, command: &str) -> CliResult<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((node.to_string(), command.to_string()));
        Ok(!self.fail_nodes.contains(node))
    }

    fn capture(&self, node: &str, command: &str) -> CliResult<SubprocessResult> {
        self.calls
            .lock()
            .unwrap()
            .push((node.to_string(), command.to_string()));
        if self.fail_nodes.contains(node) {
            Err(CliError::unreachable(node, "connection refused"))
        } else {
            Ok(SubprocessResult {
                success: true,
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }
}

/// A worker node whose services all map through two systemd unit groups:
/// svc_a and svc_b share unit g1, svc_c has its own unit g2.
pub fn grouped_node(name: &str) -> Value {
    json!({
        "name": name,
        "run_list": ["role[proxy]"],
        "redborder": {
            "services": {"svc_a": true, "svc_b": true, "svc_c": true},
            "systemdservices": {
                "svc_a": ["g1"],
                "svc_b": ["g1"],
                "svc_c": ["g2"]
            }
        }
    })
}

/// A manager node with the same grouping plus protected services.
pub fn manager_node(name: &str) -> Value {
    json!({
        "name": name,
        "run_list": ["role[manager]"],
        "redborder": {
            "services": {"svc_a": true, "svc_b": true, "svc_c": true, "s3": true},
            "systemdservices": {
                "svc_a": ["g1"],
                "svc_b": ["g1"],
                "svc_c": ["g2"],
                "s3": ["minio"]
            }
        }
    })
}

//! Production cluster directory: membership over the local agent's HTTP
//! API, node/role records from the on-disk configuration-management mirror.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{CliError, CliResult, NotFoundKind};

use super::directory::ClusterDirectory;
use super::node::{Node, RoleRecord};

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(rename = "Name")]
    name: String,
}

/// Cluster directory backed by the membership agent and `/var/chef/data`.
pub struct AgentDirectory {
    agent_url: String,
    data_dir: PathBuf,
    http: ureq::Agent,
}

impl AgentDirectory {
    pub fn new(settings: &Settings) -> Self {
        let timeout = Duration::from_secs(settings.agent.timeout_seconds);
        let http = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Self {
            agent_url: settings.agent.url.clone(),
            data_dir: settings.paths.chef_data_dir.clone(),
            http,
        }
    }

    fn node_path(&self, name: &str) -> PathBuf {
        self.data_dir.join("node").join(format!("{}.json", name))
    }

    fn role_path(&self, name: &str) -> PathBuf {
        self.data_dir.join("role").join(format!("{}.json", name))
    }

    fn read_document(&self, path: &PathBuf) -> CliResult<Option<serde_json::Value>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, path: &PathBuf, document: &serde_json::Value) -> CliResult<()> {
        let pretty = serde_json::to_string_pretty(document)?;
        std::fs::write(path, pretty + "\n")?;
        Ok(())
    }
}

impl ClusterDirectory for AgentDirectory {
    fn members(&self) -> CliResult<Vec<String>> {
        let url = format!("{}/v1/agent/members", self.agent_url);
        let response = self
            .http
            .get(&url)
            .call()
            .map_err(|e| CliError::unreachable("membership agent", e))?;
        let members: Vec<Member> = response
            .into_json()
            .map_err(|e| CliError::unreachable("membership agent", e))?;
        let names: Vec<String> = members.into_iter().map(|m| m.name).collect();
        debug!(count = names.len(), "membership agent reported members");
        Ok(names)
    }

    fn node(&self, name: &str) -> CliResult<Node> {
        match self.read_document(&self.node_path(name))? {
            Some(document) => Node::from_document(document),
            None => Err(CliError::NotFound {
                kind: NotFoundKind::Node {
                    name: name.to_string(),
                },
            }),
        }
    }

    fn save_node(&self, node: &Node) -> CliResult<()> {
        self.write_document(&self.node_path(&node.name), node.document())
    }

    fn role(&self, name: &str) -> CliResult<RoleRecord> {
        match self.read_document(&self.role_path(name))? {
            Some(document) => RoleRecord::from_document(document),
            None => Err(CliError::NotFound {
                kind: NotFoundKind::Node {
                    name: name.to_string(),
                },
            }),
        }
    }

    fn save_role(&self, role: &RoleRecord) -> CliResult<()> {
        self.write_document(&self.role_path(&role.name), role.document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn directory_with_data(dir: &TempDir) -> AgentDirectory {
        let mut settings = Settings::default();
        settings.paths.chef_data_dir = dir.path().to_path_buf();
        // Port 1 refuses connections, keeping membership deterministic.
        settings.agent.url = "http://127.0.0.1:1".to_string();
        settings.agent.timeout_seconds = 1;
        std::fs::create_dir_all(dir.path().join("node")).unwrap();
        std::fs::create_dir_all(dir.path().join("role")).unwrap();
        AgentDirectory::new(&settings)
    }

    #[test]
    fn test_node_round_trip() {
        let tmp = TempDir::new().unwrap();
        let directory = directory_with_data(&tmp);
        let doc = json!({
            "name": "rb01",
            "run_list": ["role[manager]"],
            "redborder": {"services": {"kafka": true}},
            "extra": {"untyped": [1, 2, 3]}
        });
        std::fs::write(
            tmp.path().join("node/rb01.json"),
            serde_json::to_string(&doc).unwrap(),
        )
        .unwrap();

        let mut node = directory.node("rb01").unwrap();
        node.set_service_override("kafka", false);
        directory.save_node(&node).unwrap();

        let reread: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("node/rb01.json")).unwrap())
                .unwrap();
        assert_eq!(reread["extra"]["untyped"], json!([1, 2, 3]));
        assert_eq!(
            reread["override"]["redborder"]["services"]["kafka"],
            json!(false)
        );
    }

    #[test]
    fn test_missing_node_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let directory = directory_with_data(&tmp);
        assert!(matches!(
            directory.node("ghost"),
            Err(CliError::NotFound { .. })
        ));
    }

    #[test]
    fn test_agent_down_is_unreachable() {
        let tmp = TempDir::new().unwrap();
        let directory = directory_with_data(&tmp);
        assert!(matches!(
            directory.members(),
            Err(CliError::Unreachable { .. })
        ));
    }
}

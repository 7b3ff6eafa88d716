//! Configuration settings for the redborder CLI.
//!
//! Every field has a default matching the appliance layout, so the
//! configuration file is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/redborder/rbcli.toml";

/// Main configuration structure for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logstash: LogstashConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Membership agent endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the local membership agent.
    #[serde(default = "default_agent_url")]
    pub url: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

/// Logstash monitoring API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LogstashConfig {
    /// Base URL of the local Logstash node-stats API.
    #[serde(default = "default_logstash_url")]
    pub url: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

/// SSH settings for remote command execution.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// Private key used for root access to cluster nodes.
    #[serde(default = "default_ssh_key")]
    pub key_path: PathBuf,
    /// SSH connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Overall timeout for a remote command in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
}

/// Well-known filesystem paths.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Flat service-name -> enabled map for non-manager nodes.
    #[serde(default = "default_services_file")]
    pub services_file: PathBuf,
    /// External-service markers data bag item.
    #[serde(default = "default_external_services_file")]
    pub external_services_file: PathBuf,
    /// On-disk configuration-management mirror holding node/ and role/.
    #[serde(default = "default_chef_data_dir")]
    pub chef_data_dir: PathBuf,
    /// Root of the check-script tree.
    #[serde(default = "default_check_root")]
    pub check_root: PathBuf,
    /// Rails memcached configuration (YAML).
    #[serde(default = "default_memcached_config")]
    pub memcached_config: PathBuf,
    /// PostgreSQL data directory, used to detect a decommissioned instance.
    #[serde(default = "default_postgres_data_dir")]
    pub postgres_data_dir: PathBuf,
}

fn default_agent_url() -> String {
    "http://localhost:8500".to_string()
}

fn default_logstash_url() -> String {
    "http://localhost:9600".to_string()
}

fn default_http_timeout() -> u64 {
    5
}

fn default_ssh_key() -> PathBuf {
    PathBuf::from("/var/www/rb-rails/config/rsa")
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_command_timeout() -> u64 {
    300
}

fn default_services_file() -> PathBuf {
    PathBuf::from("/etc/redborder/services.json")
}

fn default_external_services_file() -> PathBuf {
    PathBuf::from("/var/chef/data/data_bag/rBglobal/external_services.json")
}

fn default_chef_data_dir() -> PathBuf {
    PathBuf::from("/var/chef/data")
}

fn default_check_root() -> PathBuf {
    PathBuf::from("/usr/lib/redborder/lib/check")
}

fn default_memcached_config() -> PathBuf {
    PathBuf::from("/var/www/rb-rails/config/memcached_config.yml")
}

fn default_postgres_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/pgsql/data")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: default_agent_url(),
            timeout_seconds: default_http_timeout(),
        }
    }
}

impl Default for LogstashConfig {
    fn default() -> Self {
        Self {
            url: default_logstash_url(),
            timeout_seconds: default_http_timeout(),
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            key_path: default_ssh_key(),
            connect_timeout_seconds: default_connect_timeout(),
            command_timeout_seconds: default_command_timeout(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            services_file: default_services_file(),
            external_services_file: default_external_services_file(),
            chef_data_dir: default_chef_data_dir(),
            check_root: default_check_root(),
            memcached_config: default_memcached_config(),
            postgres_data_dir: default_postgres_data_dir(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            logstash: LogstashConfig::default(),
            ssh: SshConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| CliError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;

        Ok(settings)
    }

    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist. A present-but-broken file is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.agent.url, "http://localhost:8500");
        assert_eq!(settings.ssh.connect_timeout_seconds, 5);
        assert_eq!(
            settings.paths.services_file,
            PathBuf::from("/etc/redborder/services.json")
        );
    }

    #[test]
    fn test_partial_file_overrides() {
        let settings: Settings = toml::from_str(
            r#"
            [agent]
            url = "http://127.0.0.1:8501"
            "#,
        )
        .unwrap();
        assert_eq!(settings.agent.url, "http://127.0.0.1:8501");
        // Untouched sections keep their defaults.
        assert_eq!(settings.logstash.url, "http://localhost:9600");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::load_or_default("/nonexistent/rbcli.toml").unwrap();
        assert_eq!(settings.agent.timeout_seconds, 5);
    }
}

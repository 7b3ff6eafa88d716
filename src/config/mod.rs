//! Configuration module.

mod settings;

pub use settings::{
    AgentConfig, LogstashConfig, PathsConfig, Settings, SshConfig, DEFAULT_CONFIG_PATH,
};

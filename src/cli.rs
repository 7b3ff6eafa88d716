//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rbcli", version, about = "redborder cluster administration")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cluster node inventory and remote execution.
    #[command(subcommand)]
    Node(NodeCommand),
    /// Service policy and status.
    #[command(subcommand)]
    Service(ServiceCommand),
    /// Health check framework.
    #[command(subcommand)]
    Check(CheckCommand),
    /// Logstash pipeline introspection.
    #[command(subcommand)]
    Logstash(LogstashCommand),
    /// Memcached inspection.
    #[command(subcommand)]
    Memcached(MemcachedCommand),
    /// Zookeeper ensemble administration.
    #[command(subcommand)]
    Zookeeper(ZookeeperCommand),
    /// Initial appliance setup.
    #[command(subcommand)]
    Setup(SetupCommand),
    /// Web UI rails environment.
    #[command(subcommand)]
    Rails(RailsCommand),
}

#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// List cluster members.
    List {
        /// Sort nodes alphabetically instead of membership order.
        #[arg(short, long)]
        alphabetically: bool,
        /// One node per line, names only.
        #[arg(short, long)]
        compact: bool,
        /// Include the node mode from serf tags.
        #[arg(short = 'x', long = "extend")]
        extended: bool,
    },
    /// Run a shell command on one node or every node.
    Execute {
        /// Target node name, or "all".
        node: String,
        /// Command and arguments to run.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

/// Target selector shared by the service verbs.
#[derive(Debug, Args)]
pub struct TargetNode {
    /// Node to act on ("all" for every member). Defaults to this host.
    #[arg(short = 'N', long = "node", value_name = "NODE")]
    pub node: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// Table of local services with systemd state.
    List {
        /// Skip per-unit memory and uptime details.
        #[arg(short, long)]
        quiet: bool,
        /// Disable colored output.
        #[arg(short, long)]
        no_color: bool,
    },
    /// Cluster-wide service status table.
    All {
        /// Skip runtime details.
        #[arg(short, long)]
        quiet: bool,
        /// Disable colored output.
        #[arg(short, long)]
        no_color: bool,
    },
    /// Persistently enable a service and start its units.
    Enable {
        #[command(flatten)]
        target: TargetNode,
        service: String,
    },
    /// Persistently disable a service and stop its units.
    Disable {
        #[command(flatten)]
        target: TargetNode,
        service: String,
    },
    /// Start units without changing policy.
    Start {
        #[command(flatten)]
        target: TargetNode,
        #[arg(required = true)]
        services: Vec<String>,
    },
    /// Stop units without changing policy.
    Stop {
        #[command(flatten)]
        target: TargetNode,
        #[arg(required = true)]
        services: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Run health checks and aggregate their results.
    Status {
        /// Run only the checks for one service.
        #[arg(long, value_name = "NAME")]
        service: Option<String>,
        /// Also append all output to this file.
        #[arg(long, value_name = "FILE")]
        output_file: Option<PathBuf>,
        /// Ask checks for uncolored output.
        #[arg(long)]
        colorless: bool,
        /// Ask checks for extended detail.
        #[arg(long)]
        extended: bool,
        /// Ask checks to print failures only.
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum LogstashCommand {
    /// List pipelines and recent reload failures.
    Pipelines,
    /// Event and plugin detail for one pipeline.
    Pipeline { name: String },
    /// Logstash process stats.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum MemcachedCommand {
    /// Slab display and stats per memcached node.
    Status {
        /// Show server stats.
        #[arg(short, long)]
        stats: bool,
        /// Show the slab display.
        #[arg(short, long)]
        display: bool,
    },
    /// List cached keys, optionally filtered by substring.
    Keys {
        /// Keep keys that do NOT match the patterns.
        #[arg(short = 'v', long = "invert-match")]
        invert: bool,
        patterns: Vec<String>,
    },
    /// Fetch values for matching keys.
    Values {
        /// Keep keys that do NOT match the patterns.
        #[arg(short = 'v', long = "invert-match")]
        invert: bool,
        #[arg(required = true)]
        patterns: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ZookeeperCommand {
    /// Local ensemble member status.
    Status,
    /// Stop consumers, wipe ensemble state and restart the pipeline.
    Clean {
        /// Also wipe kafka data directories.
        #[arg(short, long)]
        kafka: bool,
        /// Reassign kafka partitions after topic creation.
        #[arg(short, long)]
        partitions: bool,
        /// Also wipe the /druid znode.
        #[arg(short, long)]
        druid: bool,
        /// Also wipe the /consumers znode.
        #[arg(short, long)]
        consumer: bool,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SetupCommand {
    /// Launch the interactive setup wizard.
    Wizard,
}

#[derive(Debug, Subcommand)]
pub enum RailsCommand {
    /// Open a rails console against the web UI.
    Console,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_service_start_target_flag() {
        let cli = Cli::parse_from(["rbcli", "service", "start", "-N", "rb01", "kafka", "druid"]);
        match cli.command {
            Command::Service(ServiceCommand::Start { target, services }) => {
                assert_eq!(target.node.as_deref(), Some("rb01"));
                assert_eq!(services, vec!["kafka", "druid"]);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_node_execute_trailing_args() {
        let cli = Cli::parse_from(["rbcli", "node", "execute", "all", "uptime", "-p"]);
        match cli.command {
            Command::Node(NodeCommand::Execute { node, command }) => {
                assert_eq!(node, "all");
                assert_eq!(command, vec!["uptime", "-p"]);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_memcached_invert_flag() {
        let cli = Cli::parse_from(["rbcli", "memcached", "keys", "-v", "session"]);
        match cli.command {
            Command::Memcached(MemcachedCommand::Keys { invert, patterns }) => {
                assert!(invert);
                assert_eq!(patterns, vec!["session"]);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }
}

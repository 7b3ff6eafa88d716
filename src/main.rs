use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rbcli::cli::{
    CheckCommand, Cli, Command, LogstashCommand, MemcachedCommand, NodeCommand, RailsCommand,
    ServiceCommand, SetupCommand, ZookeeperCommand,
};
use rbcli::cluster::{local_hostname, AgentDirectory, SshExecutor};
use rbcli::commands::{self, check::CheckFlags, CommandContext};
use rbcli::config::{Settings, DEFAULT_CONFIG_PATH};
use rbcli::error::CliResult;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RBCLI_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    let settings = Settings::load_or_default(&config_path)?;

    let directory = AgentDirectory::new(&settings);
    let remote = SshExecutor::new(&settings);
    let ctx = CommandContext {
        settings: &settings,
        directory: &directory,
        remote: &remote,
        local_host: local_hostname(),
    };

    match cli.command {
        Command::Node(cmd) => match cmd {
            NodeCommand::List {
                alphabetically,
                compact,
                extended,
            } => commands::node::list(&ctx, alphabetically, compact, extended),
            NodeCommand::Execute { node, command } => {
                commands::node::execute(&ctx, &node, &command)
            }
        },
        Command::Service(cmd) => match cmd {
            ServiceCommand::List { quiet, no_color } => {
                commands::service::list(&ctx, quiet, no_color)
            }
            ServiceCommand::All { quiet, no_color } => {
                commands::service::all(&ctx, quiet, no_color)
            }
            ServiceCommand::Enable { target, service } => {
                commands::service::enable(&ctx, target.node, &service)
            }
            ServiceCommand::Disable { target, service } => {
                commands::service::disable(&ctx, target.node, &service)
            }
            ServiceCommand::Start { target, services } => {
                commands::service::start(&ctx, target.node, &services)
            }
            ServiceCommand::Stop { target, services } => {
                commands::service::stop(&ctx, target.node, &services)
            }
        },
        Command::Check(cmd) => match cmd {
            CheckCommand::Status {
                service,
                output_file,
                colorless,
                extended,
                quiet,
            } => commands::check::status(
                &settings.paths.check_root,
                service.as_deref(),
                output_file.as_deref(),
                CheckFlags {
                    colorless,
                    extended,
                    quiet,
                },
            ),
        },
        Command::Logstash(cmd) => match cmd {
            LogstashCommand::Pipelines => commands::logstash::pipelines(&settings),
            LogstashCommand::Pipeline { name } => commands::logstash::pipeline(&settings, &name),
            LogstashCommand::Status => commands::logstash::status(&settings),
        },
        Command::Memcached(cmd) => match cmd {
            MemcachedCommand::Status { stats, display } => {
                commands::memcached::status(&ctx, stats, display)
            }
            MemcachedCommand::Keys { invert, patterns } => {
                commands::memcached::keys(&settings, invert, &patterns)
            }
            MemcachedCommand::Values { invert, patterns } => {
                commands::memcached::values(&settings, invert, &patterns)
            }
        },
        Command::Zookeeper(cmd) => match cmd {
            ZookeeperCommand::Status => commands::zookeeper::status(),
            ZookeeperCommand::Clean {
                kafka,
                partitions,
                druid,
                consumer,
                force,
            } => commands::zookeeper::clean(&ctx, kafka, partitions, druid, consumer, force),
        },
        Command::Setup(SetupCommand::Wizard) => commands::setup::wizard(),
        Command::Rails(RailsCommand::Console) => commands::rails::console(),
    }
}

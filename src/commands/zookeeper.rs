//! `rbcli zookeeper`: broker status and full cluster state cleanup.
//!
//! `clean` is deliberately sequential: consumers are stopped before the
//! ensemble, data directories are wiped on every node, and the ensemble is
//! restarted before anything that depends on it.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::CliResult;
use crate::executor::SubprocessBuilder;

use super::{service, CommandContext};

/// Services that consume zookeeper and must be down during a wipe, in
/// shutdown order.
const DEPENDENT_SERVICES: &[&str] = &[
    "druid-realtime",
    "druid-indexer",
    "druid-overlord",
    "druid-coordinator",
    "druid-historical",
    "druid-broker",
    "redborder-monitor",
    "webui",
    "f2k",
    "n2klocd",
    "freeradius",
    "redborder-social",
    "nmspd",
    "snmpd",
    "logstash",
    "kafka",
    "sfacctd",
];

const ENSEMBLE_UNITS: &[&str] = &["zookeeper", "zookeeper2"];

const SETTLE_DELAY: Duration = Duration::from_secs(10);

/// `zookeeper status`: run zkServer.sh attached to the terminal.
pub fn status() -> CliResult<()> {
    SubprocessBuilder::new("/usr/bin/zkServer.sh")
        .arg("status")
        .inherit_io()
        .no_timeout()
        .run()?;
    Ok(())
}

fn confirm(prompt: &str) -> CliResult<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Stop a set of services cluster-wide, tolerating partial failures.
fn stop_everywhere(ctx: &CommandContext, services: &[&str]) {
    let names: Vec<String> = services.iter().map(|s| s.to_string()).collect();
    if let Err(e) = service::stop(ctx, Some("all".to_string()), &names) {
        warn!(error = %e, "some services failed to stop, continuing");
    }
}

fn start_everywhere(ctx: &CommandContext, services: &[&str]) {
    let names: Vec<String> = services.iter().map(|s| s.to_string()).collect();
    if let Err(e) = service::start(ctx, Some("all".to_string()), &names) {
        warn!(error = %e, "some services failed to start, continuing");
    }
}

/// Run a shell command on every cluster member, locally or over ssh.
fn run_everywhere(ctx: &CommandContext, command: &str) -> CliResult<()> {
    for name in ctx.directory.members()? {
        let ok = if name == ctx.local_host {
            SubprocessBuilder::new("sh")
                .arg("-c")
                .arg(command)
                .run()
                .map(|r| r.success)
                .unwrap_or(false)
        } else {
            ctx.remote.run(&name, command).unwrap_or(false)
        };
        if !ok {
            warn!(node = %name, command, "cleanup command failed");
        }
    }
    Ok(())
}

/// Delete a zookeeper subtree through zkCli.
fn wipe_znode(path: &str) -> CliResult<()> {
    let script = format!(
        "echo 'deleteall {}' | /usr/bin/zkCli.sh -server zookeeper.service",
        path
    );
    SubprocessBuilder::new("sh")
        .arg("-c")
        .arg(&script)
        .no_timeout()
        .run()?;
    Ok(())
}

/// `zookeeper clean`: wipe ensemble state and bring the pipeline back up.
pub fn clean(
    ctx: &CommandContext,
    kafka: bool,
    partitions: bool,
    druid: bool,
    consumer: bool,
    force: bool,
) -> CliResult<()> {
    if !force
        && !confirm("This will STOP the processing pipeline and wipe zookeeper state. Continue?")?
    {
        println!("Aborted.");
        return Ok(());
    }

    println!("Stopping chef-client on all nodes...");
    stop_everywhere(ctx, &["chef-client"]);

    println!("Stopping dependent services...");
    stop_everywhere(ctx, DEPENDENT_SERVICES);

    println!("Stopping zookeeper ensemble...");
    stop_everywhere(ctx, ENSEMBLE_UNITS);

    println!("Wiping zookeeper data directories...");
    run_everywhere(ctx, "rm -rf /tmp/zookeeper/version-2/* /tmp/zookeeper2/version-2/*")?;

    if kafka {
        println!("Wiping kafka data directories...");
        run_everywhere(ctx, "rm -rf /tmp/kafka/*")?;
    }

    println!("Starting zookeeper ensemble...");
    start_everywhere(ctx, ENSEMBLE_UNITS);
    thread::sleep(SETTLE_DELAY);

    println!("Starting kafka...");
    start_everywhere(ctx, &["kafka"]);
    thread::sleep(SETTLE_DELAY);

    println!("Recreating kafka topics...");
    SubprocessBuilder::new("/usr/lib/redborder/bin/rb_create_topics")
        .no_timeout()
        .run()?;

    if partitions {
        println!("Reassigning partitions...");
        SubprocessBuilder::new("rb_reassign_partitions")
            .arg("-de")
            .no_timeout()
            .run()?;
    }

    if druid {
        println!("Wiping druid znodes...");
        wipe_znode("/druid")?;
    }

    if consumer {
        println!("Wiping consumer offsets...");
        wipe_znode("/consumers")?;
    }

    println!("Starting chef-client on all nodes...");
    start_everywhere(ctx, &["chef-client"]);

    println!("Done.");
    Ok(())
}

//! `rbcli node`: membership listing and cluster-wide command execution.

use std::time::Duration;

use serde::Deserialize;

use crate::cluster::resolve_targets;
use crate::error::CliResult;
use crate::executor::run_command;

use super::{finish_batch, CommandContext};

#[derive(Debug, Deserialize)]
struct SerfMembersDoc {
    #[serde(default)]
    members: Vec<SerfMember>,
}

#[derive(Debug, Deserialize)]
struct SerfMember {
    #[serde(default)]
    tags: std::collections::BTreeMap<String, String>,
}

fn serf_node_mode(node: &str) -> Option<String> {
    let result = run_command(
        "serf",
        &[
            "members",
            "-status",
            "alive",
            &format!("-name={}", node),
            "-format=json",
        ],
        Duration::from_secs(10),
    )
    .ok()?;
    let doc: SerfMembersDoc = serde_json::from_str(&result.stdout).ok()?;
    doc.members
        .first()
        .and_then(|m| m.tags.get("mode").cloned())
}

/// `node list`: cluster members as the membership agent reports them.
pub fn list(
    ctx: &CommandContext,
    alphabetically: bool,
    compact: bool,
    extended: bool,
) -> CliResult<()> {
    let mut nodes = ctx.directory.members()?;
    if nodes.is_empty() {
        println!("Error: membership agent returned no nodes");
        return finish_batch(1);
    }

    if alphabetically {
        nodes.sort();
    }

    if compact {
        println!("{}", nodes.join(" "));
        return Ok(());
    }

    for node in &nodes {
        println!("{}", node);
        if extended {
            let mode = serf_node_mode(node).unwrap_or_else(|| "unknown".to_string());
            println!("  mode : {}", mode);
        }
    }
    Ok(())
}

/// `node execute`: run a shell command on one node or on all of them.
pub fn execute(ctx: &CommandContext, target: &str, command: &[String]) -> CliResult<()> {
    let targets = resolve_targets(ctx.directory, target, &ctx.local_host)?;
    let command = command.join(" ");
    let mut failures = 0usize;

    for name in targets {
        println!("##############################################");
        println!("# Node: {}", name);
        println!("##############################################");
        match ctx.remote.run(&name, &command) {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(e) => {
                println!("ERROR: {}", e);
                failures += 1;
            }
        }
    }
    finish_batch(failures)
}

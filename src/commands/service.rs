//! `rbcli service`: list, cluster-wide table, enable/disable, start/stop.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::cluster::{resolve_targets, Node};
use crate::error::{CliError, CliResult, PolicyKind};
use crate::executor::{run_command, systemctl};
use crate::output::{format_elapsed, humanize_bytes, is_recent_runtime, Palette};
use crate::services::{
    classify_local, classify_remote, ensure_redundancy, is_external, logicals_for_unit,
    peers_in_group, postgres_is_primary, postgres_present, read_external_services, unit_known,
    ServiceState, ServicesFile,
};

use super::{finish_batch, CommandContext};

fn paint_state(palette: &Palette, state: ServiceState, text: &str) -> String {
    match state {
        ServiceState::Running => palette.green(text),
        ServiceState::Stopped => palette.yellow(text),
        ServiceState::External => palette.blue(text),
        ServiceState::Error | ServiceState::Unknown => palette.red(text),
    }
}

/// `service list`: the local node's service table.
pub fn list(ctx: &CommandContext, quiet: bool, no_color: bool) -> CliResult<()> {
    let palette = Palette::new(no_color);
    let services_file = ServicesFile::new(&ctx.settings.paths.services_file);
    if !services_file.exists() {
        println!("ERROR: Services list not found");
        return finish_batch(1);
    }
    let services = services_file.enabled_map()?;
    let externals = read_external_services(&ctx.settings.paths.external_services_file);

    let mut running = 0usize;
    let mut stopped = 0usize;
    let mut external = 0usize;
    let mut errors = 0usize;
    let mut total_memory = 0u64;

    let full_rule = "-".repeat(106);
    let quiet_rule = "-".repeat(65);
    if quiet {
        println!("=========================== Services ============================");
        println!("{:<33} {:<10}", "Service", format!("Status({})", ctx.local_host));
        println!("{}", quiet_rule);
    } else {
        println!("=========================================== Services =====================================================");
        println!(
            "{:<33} {:<33} {:<15} {:<10} {:<33}",
            "Service",
            format!("Status({})", ctx.local_host),
            "Runtime",
            "Memory",
            "Cgroup"
        );
        println!("{}", full_rule);
    }

    for (unit, enabled) in &services {
        let active = systemctl::is_active(unit);
        let state = classify_local(&active, *enabled, is_external(unit, &externals));
        match state {
            ServiceState::Running => running += 1,
            ServiceState::Stopped => stopped += 1,
            ServiceState::External => external += 1,
            ServiceState::Error | ServiceState::Unknown => errors += 1,
        }

        let status = paint_state(&palette, state, &format!("{:<33}", state.label()));
        if quiet {
            println!("{:<33} {}", format!("{}:", unit), status);
            continue;
        }

        let (runtime, memory) = if state == ServiceState::Running {
            let runtime = systemctl::unit_active_seconds(unit)
                .map(format_elapsed)
                .unwrap_or_else(|| "N/A".to_string());
            let bytes = systemctl::unit_memory_bytes(unit).unwrap_or(0);
            total_memory += bytes;
            (runtime, humanize_bytes(bytes))
        } else {
            ("N/A".to_string(), "0B".to_string())
        };
        let cgroup = systemctl::unit_cgroup_slice(unit);

        let runtime_col = if is_recent_runtime(&runtime) {
            palette.blink(&format!("{:<15}", runtime))
        } else {
            format!("{:<15}", runtime)
        };
        println!(
            "{:<33} {} {} {:<10} {:<25}",
            format!("{}:", unit),
            status,
            runtime_col,
            memory,
            cgroup
        );
    }

    if quiet {
        println!("{}", quiet_rule);
        println!("{:<33} {:<10}", "Total:", services.len());
        println!("{}", quiet_rule);
    } else {
        println!("{}", full_rule);
        println!(
            "{:<33} {:<10} {:>49}",
            "Total:",
            services.len(),
            humanize_bytes(total_memory)
        );
        println!("{}", full_rule);
    }
    println!(
        "Running: {}  /  Stopped: {}  /  External: {}  /  Errors: {}\n",
        running, stopped, external, errors
    );

    match ctx.directory.node(&ctx.local_host) {
        Ok(node) if node.uptime_seconds.is_some() => {
            let uptime_seconds = node.uptime_seconds.unwrap_or(0);
            let started =
                chrono::Local::now() - chrono::Duration::seconds(uptime_seconds as i64);
            println!(
                "{} runtime: {}",
                ctx.local_host,
                node.uptime.as_deref().unwrap_or("N/A")
            );
            println!("{} start time: {}\n", ctx.local_host, started);
        }
        _ => println!("Error getting manager node\n"),
    }

    finish_batch(errors)
}

/// The batched probe every manager answers for `service all`: one
/// `unit|active|enabled|runtime` line per service.
fn remote_probe_script(units: &[String], show_runtime: bool) -> String {
    let quoted: Vec<String> = units.iter().map(|u| format!("'{}'", u)).collect();
    format!(
        r#"services=({services})
for s in "${{services[@]}}"; do
  st=$(systemctl is-active "$s" 2>/dev/null || echo unknown)
  st=$(echo "$st" | head -n 1)
  en=$(systemctl is-enabled "$s" 2>/dev/null || echo disabled)
  en=$(echo "$en" | head -n 1)
  rt="N/A"
  if [ "$st" = "active" ] && [ "{show_rt}" = "1" ]; then
    rt=$(systemctl status "$s" | grep 'Active:' | awk '{{for(i=9;i<=NF;i++) printf $i " "; print ""}}')
  fi
  printf "%s|%s|%s|%s\n" "$s" "$st" "$en" "$rt"
done"#,
        services = quoted.join(" "),
        show_rt = if show_runtime { "1" } else { "0" },
    )
}

/// Units the cluster table reports: manager services in name order, each
/// unit listed once at its first appearance.
fn manager_units(node: &Node) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();
    for svc in &node.manager_services {
        if let Some(list) = node.systemd_services.get(svc) {
            for unit in list {
                if !units.contains(unit) {
                    units.push(unit.clone());
                }
            }
        }
    }
    units
}

fn alive_serf_members() -> CliResult<Vec<String>> {
    let result = run_command("serf", &["members"], Duration::from_secs(10))?;
    let mut hosts: Vec<String> = result
        .stdout
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match (cols.first(), cols.get(2)) {
                (Some(name), Some(&"alive")) => Some(name.to_string()),
                _ => None,
            }
        })
        .collect();
    hosts.sort();
    Ok(hosts)
}

/// `service all`: the service table across every live manager.
pub fn all(ctx: &CommandContext, quiet: bool, no_color: bool) -> CliResult<()> {
    let palette = Palette::new(no_color);
    let show_runtime = !quiet;

    let node = ctx.directory.node(&ctx.local_host)?;
    let units = manager_units(&node);

    let externals = read_external_services(&ctx.settings.paths.external_services_file);
    let hosts = alive_serf_members()?;
    if hosts.is_empty() {
        eprintln!("No live managers found");
        return Ok(());
    }

    let script = remote_probe_script(&units, show_runtime);
    let mut host_data: BTreeMap<String, BTreeMap<String, (String, String, String)>> =
        BTreeMap::new();
    for host in &hosts {
        let mut rows = BTreeMap::new();
        match ctx.remote.capture(host, &script) {
            Ok(result) if result.success => {
                for line in result.stdout.lines() {
                    let mut parts = line.splitn(4, '|');
                    if let (Some(unit), Some(st), Some(en), Some(rt)) =
                        (parts.next(), parts.next(), parts.next(), parts.next())
                    {
                        rows.insert(
                            unit.to_string(),
                            (st.to_string(), en.to_string(), rt.to_string()),
                        );
                    }
                }
            }
            Ok(_) | Err(_) => debug!(host, "manager probe failed, reporting unknown"),
        }
        host_data.insert(host.clone(), rows);
    }

    let width = 30 + 35 * hosts.len();
    let rule = "-".repeat(width);
    println!("{}", rule);
    print!("{:<30}", "Service");
    for host in &hosts {
        print!("{:<35}", host);
    }
    println!();
    println!("{}", rule);

    let mut running = 0usize;
    let mut stopped = 0usize;
    let mut external = 0usize;
    let mut errors = 0usize;
    let mut host_totals = vec![0usize; hosts.len()];

    for unit in &units {
        print!("{:<30}", format!("{}:", unit));
        for (idx, host) in hosts.iter().enumerate() {
            let default = ("unknown".to_string(), "unknown".to_string(), "N/A".to_string());
            let (st, en, rt) = host_data
                .get(host)
                .and_then(|rows| rows.get(unit))
                .unwrap_or(&default);

            let mut state = classify_remote(st, en);
            if is_external(unit, &externals) {
                state = ServiceState::External;
            }
            match state {
                ServiceState::Running => running += 1,
                ServiceState::Stopped => stopped += 1,
                ServiceState::External => external += 1,
                ServiceState::Error => errors += 1,
                ServiceState::Unknown => {}
            }
            if state != ServiceState::Unknown {
                host_totals[idx] += 1;
            }

            let rt = if rt.trim().is_empty() { "N/A" } else { rt.trim() };
            let status_col = paint_state(&palette, state, &format!("{:<14}", state.label()));
            let runtime_col = if show_runtime && is_recent_runtime(rt) {
                palette.blink(&format!("{:>20}", rt))
            } else {
                paint_state(&palette, state, &format!("{:>20}", rt))
            };
            print!("{}{}|", status_col, runtime_col);
        }
        println!();
    }

    println!("{}", rule);
    print!("{:<30}", "Total:");
    for count in &host_totals {
        print!("{:<35}", count);
    }
    println!();
    println!("{}", rule);
    println!(
        "Running: {}  /  Stopped: {}  /  External: {}  /  Errors: {}",
        running, stopped, external, errors
    );
    Ok(())
}

/// `service enable` / `service disable` shared body.
fn apply_enablement(
    ctx: &CommandContext,
    target: &str,
    service: &str,
    enabled: bool,
) -> CliResult<()> {
    let verb = if enabled { "enabled" } else { "disabled" };
    let targets = resolve_targets(ctx.directory, target, &ctx.local_host)?;
    let mut failures = 0usize;

    for name in targets {
        let mut node = match ctx.directory.node(&name) {
            Ok(node) => node,
            Err(e) => {
                println!("ERROR: Node not found! ({})", e);
                failures += 1;
                continue;
            }
        };

        if node.is_manager() {
            let peers = peers_in_group(&node.systemd_services, service);
            if peers.is_empty() {
                println!("ERROR: Service not found");
                failures += 1;
                continue;
            }
            let mut role = match ctx.directory.role(&name) {
                Ok(role) => role,
                Err(e) => {
                    println!("ERROR: could not load role for {}: {}", name, e);
                    failures += 1;
                    continue;
                }
            };
            for peer in &peers {
                role.set_service(peer, enabled);
                node.set_service_overwrite(peer, enabled);
                println!("{} {} on {}", peer, verb, name);
            }
            ctx.directory.save_role(&role)?;
            ctx.directory.save_node(&node)?;
        } else {
            // Non-manager state is keyed by systemd unit name and persisted
            // to the flat local file.
            let mut unit_map: BTreeMap<String, bool> = node
                .systemd_services
                .iter()
                .filter_map(|(svc, units)| {
                    units.first().map(|unit| {
                        (unit.clone(), node.services.get(svc).copied().unwrap_or(false))
                    })
                })
                .collect();

            let logicals = logicals_for_unit(&node.systemd_services, service);
            if logicals.is_empty() {
                println!("ERROR: Service not found");
                failures += 1;
            } else {
                // Every logical service sharing the unit carries the toggle.
                for logical in &logicals {
                    node.set_service_override(logical, enabled);
                }
                if unit_map.contains_key(service) {
                    unit_map.insert(service.to_string(), enabled);
                }
                println!("{} {} on {}", service, verb, name);
                println!(
                    "Saving services enablement into {}",
                    ctx.settings.paths.services_file.display()
                );
                ServicesFile::new(&ctx.settings.paths.services_file)
                    .merge_write(&unit_map)?;
                ctx.directory.save_node(&node)?;
            }
        }
    }
    finish_batch(failures)
}

/// `service enable`: persist a service (and its unit group) as enabled.
pub fn enable(ctx: &CommandContext, node: Option<String>, service: &str) -> CliResult<()> {
    let target = node.unwrap_or_else(|| ctx.local_host.clone());
    apply_enablement(ctx, &target, service, true)
}

/// `service disable`: guard-railed counterpart of `enable`.
pub fn disable(ctx: &CommandContext, node: Option<String>, service: &str) -> CliResult<()> {
    if service == "postgresql" {
        if !postgres_present(&ctx.settings.paths.postgres_data_dir) {
            println!("PostgreSQL already disabled.");
            return Ok(());
        }
        if postgres_is_primary() {
            return Err(CliError::PolicyViolation {
                kind: PolicyKind::PostgresPrimary,
            });
        }
    }
    ensure_redundancy(ctx.directory, service)?;

    let target = node.unwrap_or_else(|| ctx.local_host.clone());
    apply_enablement(ctx, &target, service, false)
}

#[derive(Clone, Copy)]
enum UnitAction {
    Start,
    Stop,
}

impl UnitAction {
    fn verb(&self) -> &'static str {
        match self {
            UnitAction::Start => "start",
            UnitAction::Stop => "stop",
        }
    }

    fn past(&self) -> &'static str {
        match self {
            UnitAction::Start => "started",
            UnitAction::Stop => "stopped",
        }
    }
}

/// `service start` / `service stop` shared body: immediate systemctl
/// actions, no persisted policy change.
fn apply_action(
    ctx: &CommandContext,
    target: &str,
    services: &[String],
    action: UnitAction,
) -> CliResult<()> {
    let targets = resolve_targets(ctx.directory, target, &ctx.local_host)?;
    let mut failures = 0usize;

    for name in targets {
        let node = match ctx.directory.node(&name) {
            Ok(node) => node,
            Err(e) => {
                println!("ERROR: Node not found! ({})", e);
                failures += 1;
                continue;
            }
        };

        for service in services {
            if !unit_known(&node.systemd_services, service) {
                println!("{} is not found on {}", service, name);
                continue;
            }
            let ok = if name == ctx.local_host {
                match action {
                    UnitAction::Start => systemctl::start(service),
                    UnitAction::Stop => systemctl::stop(service),
                }
                .map(|r| r.success)
                .unwrap_or(false)
            } else {
                ctx.remote
                    .run(
                        &name,
                        &format!("systemctl {} {} &>/dev/null", action.verb(), service),
                    )
                    .unwrap_or(false)
            };
            if ok {
                println!("{} {} on {}", service, action.past(), name);
            } else {
                println!("{} failed to {} on {}", service, action.verb(), name);
                failures += 1;
            }
        }
    }
    finish_batch(failures)
}

/// `service start`.
pub fn start(ctx: &CommandContext, node: Option<String>, services: &[String]) -> CliResult<()> {
    let target = node.unwrap_or_else(|| ctx.local_host.clone());
    apply_action(ctx, &target, services, UnitAction::Start)
}

/// `service stop`.
pub fn stop(ctx: &CommandContext, node: Option<String>, services: &[String]) -> CliResult<()> {
    if services.iter().any(|s| s == "postgresql") {
        if !postgres_present(&ctx.settings.paths.postgres_data_dir) {
            println!("PostgreSQL already disabled.");
            return Ok(());
        }
        if postgres_is_primary() {
            return Err(CliError::PolicyViolation {
                kind: PolicyKind::PostgresPrimary,
            });
        }
    }
    let target = node.unwrap_or_else(|| ctx.local_host.clone());
    apply_action(ctx, &target, services, UnitAction::Stop)
}

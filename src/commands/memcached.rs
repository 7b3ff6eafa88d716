//! `rbcli memcached`: status, key listing and value inspection.
//!
//! `status` shells out to `memcached-tool`; `keys`/`values` speak the plain
//! memcached text protocol over TCP, enumerating slabs with `stats items`
//! and dumping them with `stats cachedump`.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::Deserialize;

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::executor::run_command;

use super::CommandContext;

const MEMCACHED_PORT: u16 = 11211;
const PROTOCOL_TIMEOUT: Duration = Duration::from_secs(5);

const LINE_WIDTH: usize = 149;

fn banner(fill: char, label: &str) -> String {
    if label.is_empty() {
        return fill.to_string().repeat(LINE_WIDTH);
    }
    let text = format!(" {} ", label);
    let pad = LINE_WIDTH.saturating_sub(text.len());
    let left = pad / 2;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        text,
        fill.to_string().repeat(pad - left)
    )
}

fn title() {
    println!("{}", banner('=', "Memcached"));
}

fn separator() {
    println!("{}", banner('-', ""));
}

fn bottom() {
    println!("{}", banner('=', ""));
}

fn subtitle(message: &str) {
    println!("{}", banner('-', message));
}

/// `memcached status`: slab display and/or stats for every node running
/// memcached.
pub fn status(ctx: &CommandContext, stats: bool, display: bool) -> CliResult<()> {
    let members = ctx.directory.members()?;
    let mut hosts = Vec::new();
    for name in &members {
        let node = match ctx.directory.node(name) {
            Ok(node) => node,
            Err(_) => {
                println!("ERROR: Node not found!");
                continue;
            }
        };
        if node.services.get("memcached").copied().unwrap_or(false) {
            hosts.push(name.clone());
        }
    }

    if !members.is_empty() {
        title();
    }

    let actions: &[&str] = if stats && display {
        &["display", "stats"]
    } else if stats {
        &["stats"]
    } else {
        &["display"]
    };

    for &action in actions {
        subtitle(action);
        for host in &hosts {
            subtitle(host);
            let target = format!("{}:{}", host, MEMCACHED_PORT);
            let result = run_command("memcached-tool", &[target.as_str(), action], PROTOCOL_TIMEOUT)?;
            let rows = result.stdout.lines().skip(1);

            if action == "display" {
                println!(
                    "{:>3} {:>16} {:>16} {:>16} {:>16} {:>16} {:>18} {:>18} {:>18}",
                    "id", "Item_Size", "Max_age", "Pages", "Count", "Full?", "Evicted",
                    "Evict_Time", "OOM"
                );
                for row in rows {
                    let cols: Vec<&str> = row.split_whitespace().collect();
                    if cols.len() >= 9 {
                        println!(
                            "{:>3} {:>13} {:>19} {:>14} {:>17} {:>16} {:>16} {:>16} {:>22}",
                            cols[0], cols[1], cols[2], cols[3], cols[4], cols[5], cols[6],
                            cols[7], cols[8]
                        );
                    }
                }
                separator();
            } else {
                println!("{:>36} {:>68}", "Field", "Value");
                for row in rows {
                    let cols: Vec<&str> = row.split_whitespace().collect();
                    if cols.len() >= 2 {
                        println!("{:>36} {:>68}", cols[0], cols[1]);
                        separator();
                    }
                }
            }
            bottom();
            println!();
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct MemcachedConfig {
    production: MemcachedEnv,
}

#[derive(Debug, Deserialize)]
struct MemcachedEnv {
    servers: Vec<String>,
}

fn configured_server(settings: &Settings) -> CliResult<(String, u16)> {
    let content = std::fs::read_to_string(&settings.paths.memcached_config)?;
    let config: MemcachedConfig =
        serde_yaml::from_str(&content).map_err(|e| CliError::Config {
            message: format!("invalid memcached config: {}", e),
        })?;
    let server = config
        .production
        .servers
        .first()
        .ok_or_else(|| CliError::Config {
            message: "memcached config lists no servers".to_string(),
        })?;
    let mut parts = server.splitn(2, ':');
    let host = parts.next().unwrap_or_default().to_string();
    let port = parts
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(MEMCACHED_PORT);
    Ok((host, port))
}

/// Minimal memcached text-protocol client.
struct TextClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TextClient {
    fn connect(host: &str, port: u16) -> CliResult<Self> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| CliError::unreachable("memcached", "could not resolve address"))?;
        let stream = TcpStream::connect_timeout(&addr, PROTOCOL_TIMEOUT)
            .map_err(|e| CliError::unreachable("memcached", e))?;
        stream.set_read_timeout(Some(PROTOCOL_TIMEOUT))?;
        stream.set_write_timeout(Some(PROTOCOL_TIMEOUT))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    /// Send one command and collect response lines up to the terminator.
    fn command(&mut self, command: &str) -> CliResult<Vec<String>> {
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            if line == "END" || line == "ERROR" {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }
}

/// One key as reported by `stats cachedump`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    pub slab: String,
    pub key: String,
    pub bytes: u64,
    pub expires: i64,
}

/// Parse a `STAT items:<id>:number <count>` line.
fn parse_stats_items_line(line: &str) -> Option<(String, u64)> {
    let rest = line.strip_prefix("STAT items:")?;
    let mut parts = rest.splitn(2, ':');
    let id = parts.next()?.to_string();
    let tail = parts.next()?;
    if !tail.starts_with("number ") {
        return None;
    }
    let count = tail.strip_prefix("number ")?.trim().parse().ok()?;
    Some((id, count))
}

/// Parse an `ITEM <key> [<bytes> b; <expires> s]` line.
fn parse_cachedump_line(slab: &str, line: &str) -> Option<KeyRow> {
    let rest = line.strip_prefix("ITEM ")?;
    let bracket = rest.find(" [")?;
    let key = rest[..bracket].to_string();
    let meta = rest[bracket + 2..].strip_suffix(']')?;
    let mut parts = meta.split("; ");
    let bytes = parts.next()?.strip_suffix(" b")?.parse().ok()?;
    let expires = parts.next()?.strip_suffix(" s")?.parse().ok()?;
    Some(KeyRow {
        slab: slab.to_string(),
        key,
        bytes,
        expires,
    })
}

/// Expiry epochs print as local timestamps in the key table.
fn format_expiry(expires: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_opt(expires, 0) {
        chrono::LocalResult::Single(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => expires.to_string(),
    }
}

/// Keep rows whose key contains any pattern; `invert` keeps the complement.
/// No patterns means keep everything.
fn filter_rows(rows: Vec<KeyRow>, patterns: &[String], invert: bool) -> Vec<KeyRow> {
    if patterns.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            let matched = patterns.iter().any(|p| row.key.contains(p.as_str()));
            matched != invert
        })
        .collect()
}

fn enumerate_keys(
    settings: &Settings,
    patterns: &[String],
    invert: bool,
) -> CliResult<(TextClient, Vec<KeyRow>)> {
    let (host, port) = configured_server(settings)?;
    let mut client = TextClient::connect(&host, port)?;
    let slabs: Vec<(String, u64)> = client
        .command("stats items")?
        .iter()
        .filter_map(|line| parse_stats_items_line(line))
        .collect();

    let mut rows = Vec::new();
    for (slab, count) in slabs {
        let dump = client.command(&format!("stats cachedump {} {}", slab, count))?;
        rows.extend(dump.iter().filter_map(|line| parse_cachedump_line(&slab, line)));
    }
    Ok((client, filter_rows(rows, patterns, invert)))
}

/// `memcached keys`: list stored keys, optionally filtered by substring.
pub fn keys(settings: &Settings, invert: bool, patterns: &[String]) -> CliResult<()> {
    let (_client, rows) = enumerate_keys(settings, patterns, invert)?;

    title();
    if !rows.is_empty() {
        println!("{:>3} {:>15} {:>22} {:>45}", "id", "expires", "bytes", "key");
        separator();
    }
    let last = rows.len().saturating_sub(1);
    for (idx, row) in rows.iter().enumerate() {
        println!(
            "{:>5} {:>25} {:>13} {:>45}",
            format!("{} |", row.slab),
            format!("{} | ", format_expiry(row.expires)),
            format!("{} | ", row.bytes),
            row.key
        );
        if idx != last {
            separator();
        }
    }
    bottom();
    Ok(())
}

/// `memcached values`: fetch and display values for matching keys.
pub fn values(settings: &Settings, invert: bool, patterns: &[String]) -> CliResult<()> {
    let (mut client, rows) = enumerate_keys(settings, patterns, invert)?;
    if rows.is_empty() {
        println!("There is no entry in memcached for provided keys");
        return Ok(());
    }

    title();
    println!("{:>15} {:>75}", "Key", "Value");
    separator();
    let last = rows.len().saturating_sub(1);
    for (idx, row) in rows.iter().enumerate() {
        let response = client.command(&format!("get {}", row.key))?;
        // First line is the VALUE header; the rest is the payload.
        let value = response
            .iter()
            .skip(1)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        println!("{:<43} {:>50}", row.key, value);
        if idx != last {
            separator();
        }
    }
    bottom();
    Ok(())
}

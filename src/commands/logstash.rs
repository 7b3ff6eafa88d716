//! `rbcli logstash`: read-only views over the local Logstash node-stats API.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::config::Settings;
use crate::error::{CliError, CliResult};

#[derive(Debug, Deserialize)]
struct PipelinesDoc {
    #[serde(default)]
    pipelines: BTreeMap<String, Pipeline>,
}

#[derive(Debug, Default, Deserialize)]
struct Pipeline {
    events: Option<Events>,
    #[serde(default)]
    plugins: BTreeMap<String, Vec<PluginEntry>>,
    reloads: Option<Reloads>,
}

#[derive(Debug, Deserialize)]
struct Events {
    #[serde(default)]
    filtered: u64,
    #[serde(default)]
    out: u64,
    #[serde(default)]
    duration_in_millis: u64,
}

#[derive(Debug, Deserialize)]
struct PluginEntry {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Reloads {
    #[serde(default)]
    failures: u64,
    last_error: Option<ReloadError>,
    last_failure_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReloadError {
    #[serde(default)]
    message: String,
}

fn http_agent(settings: &Settings) -> ureq::Agent {
    let timeout = Duration::from_secs(settings.logstash.timeout_seconds);
    ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout(timeout)
        .build()
}

fn get_json<T: serde::de::DeserializeOwned>(settings: &Settings, path: &str) -> CliResult<T> {
    let url = format!("{}{}", settings.logstash.url, path);
    http_agent(settings)
        .get(&url)
        .call()
        .map_err(|e| CliError::unreachable("Logstash API", e))?
        .into_json()
        .map_err(|e| CliError::unreachable("Logstash API", e))
}

fn print_reload_failures(pipeline: &Pipeline, indent: &str) {
    if let Some(reloads) = &pipeline.reloads {
        if reloads.failures != 0 {
            if let Some(error) = &reloads.last_error {
                println!("{}Error: {}", indent, error.message);
                println!(
                    "{}Last failure date: {}",
                    indent,
                    reloads.last_failure_timestamp.as_deref().unwrap_or("unknown")
                );
            }
        }
    }
}

/// `logstash pipelines`: pipeline names plus last reload failures.
pub fn pipelines(settings: &Settings) -> CliResult<()> {
    let doc: PipelinesDoc = get_json(settings, "/_node/stats/pipelines")?;
    println!("Logstash Pipelines:\n");
    for (name, pipeline) in &doc.pipelines {
        println!("{}", name);
        print_reload_failures(pipeline, "\t");
    }
    println!();
    Ok(())
}

/// `logstash pipeline <name>`: events, plugins and reload state of one
/// pipeline.
pub fn pipeline(settings: &Settings, name: &str) -> CliResult<()> {
    let doc: PipelinesDoc =
        get_json(settings, &format!("/_node/stats/pipelines/{}", name))?;
    for (name, pipeline) in &doc.pipelines {
        println!("{}", name);
        if let Some(events) = &pipeline.events {
            println!("\nEvents:");
            println!("\tFiltered: {}", events.filtered);
            println!("\tOut: {}", events.out);
            println!("\tDuration (millis): {}", events.duration_in_millis);
        }
        println!("\nPlugins:");
        for (plugin_type, entries) in &pipeline.plugins {
            println!("\t{}", plugin_type);
            let mut names: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.name.as_deref())
                .collect();
            names.dedup();
            let mut seen = std::collections::BTreeSet::new();
            for plugin in names.drain(..) {
                if seen.insert(plugin) {
                    println!("\t\t{}", plugin);
                }
            }
        }
        print_reload_failures(pipeline, "\n\t");
    }
    Ok(())
}

/// `logstash status`: raw process stats, pretty-printed.
pub fn status(settings: &Settings) -> CliResult<()> {
    let doc: serde_json::Value = get_json(settings, "/_node/stats/process")?;
    println!("Logstash Status:\n");
    println!("{}", serde_json::to_string_pretty(&doc)?);
    println!();
    Ok(())
}

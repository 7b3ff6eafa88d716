//! `rbcli check`: diagnostic check-script discovery and execution.
//!
//! Checks live under a fixed two-level tree: `commons/` holds the built-in
//! probes, and every other directory is a pluggable per-service check.
//! All discovered scripts always run; failures are aggregated into the
//! final exit status rather than short-circuiting.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{CliError, CliResult, NotFoundKind};
use crate::output::TeeOutput;

/// Built-in checks under `commons/`, in execution order.
pub const COMMON_CHECKS: [&str; 6] = ["hd", "install", "io", "killed", "licenses", "memory"];

/// One discovered runnable check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckScript {
    pub name: String,
    pub path: PathBuf,
}

/// Global flags forwarded to every check script.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckFlags {
    pub colorless: bool,
    pub extended: bool,
    pub quiet: bool,
}

impl CheckFlags {
    /// The accumulated flags as the single string argument scripts expect.
    pub fn to_flag_string(self) -> String {
        let mut flags = Vec::new();
        if self.colorless {
            flags.push("--colorless");
        }
        if self.extended {
            flags.push("--extended");
        }
        if self.quiet {
            flags.push("--quiet");
        }
        flags.join(" ")
    }
}

fn commons_script(check_root: &Path, name: &str) -> CheckScript {
    CheckScript {
        name: name.to_string(),
        path: check_root
            .join("commons")
            .join(format!("rb_check_{}.rb", name)),
    }
}

/// Discover every runnable check: the fixed commons set, then each
/// pluggable service directory in name order. Helper files (anything with
/// "functions" in the name) are never runnable.
pub fn discover(check_root: &Path) -> CliResult<Vec<CheckScript>> {
    let mut scripts: Vec<CheckScript> = COMMON_CHECKS
        .iter()
        .map(|name| commons_script(check_root, name))
        .collect();

    let mut service_dirs: Vec<PathBuf> = std::fs::read_dir(check_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| path.file_name().map(|n| n != "commons").unwrap_or(false))
        .collect();
    service_dirs.sort();

    for dir in service_dirs {
        let service = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .map(|n| !n.to_string_lossy().contains("functions"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        for path in files {
            scripts.push(CheckScript {
                name: service.clone(),
                path,
            });
        }
    }
    Ok(scripts)
}

/// Resolve a single named check: a commons entry, or a same-named script in
/// a pluggable directory. An unmatched name is fatal.
pub fn discover_one(check_root: &Path, name: &str) -> CliResult<Vec<CheckScript>> {
    if COMMON_CHECKS.contains(&name) {
        return Ok(vec![commons_script(check_root, name)]);
    }
    let dir = check_root.join(name);
    if dir.is_dir() {
        return Ok(vec![CheckScript {
            name: name.to_string(),
            path: dir.join(format!("rb_check_{}.rb", name)),
        }]);
    }
    Err(CliError::NotFound {
        kind: NotFoundKind::Check {
            name: name.to_string(),
        },
    })
}

/// Run one script, streaming its output through the tee. Returns whether it
/// exited zero; a spawn failure counts as a failed check.
fn run_script(script: &CheckScript, flags: &str, tee: &Arc<Mutex<TeeOutput>>) -> bool {
    let mut cmd = Command::new(&script.path);
    if !flags.is_empty() {
        cmd.arg(flags);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            if let Ok(mut tee) = tee.lock() {
                tee.line(&format!("ERROR: could not run {}: {}", script.path.display(), e));
            }
            return false;
        }
    };

    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let tee = Arc::clone(tee);
        readers.push(std::thread::spawn(move || {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if let Ok(mut tee) = tee.lock() {
                    tee.line(&line);
                }
            }
        }));
    }
    if let Some(stderr) = child.stderr.take() {
        let tee = Arc::clone(tee);
        readers.push(std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if let Ok(mut tee) = tee.lock() {
                    tee.line(&line);
                }
            }
        }));
    }
    for reader in readers {
        let _ = reader.join();
    }

    match child.wait() {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}

/// `check status`: run all checks, or one named check.
pub fn status(
    check_root: &Path,
    service: Option<&str>,
    output_file: Option<&Path>,
    flags: CheckFlags,
) -> CliResult<()> {
    let scripts = match service {
        Some(name) => discover_one(check_root, name)?,
        None => discover(check_root)?,
    };

    let tee = Arc::new(Mutex::new(TeeOutput::create(output_file)?));
    if let Ok(mut tee) = tee.lock() {
        tee.line(&format!(
            "DATE:  {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    let flag_string = flags.to_flag_string();
    let mut failed = 0usize;
    for script in &scripts {
        debug!(name = %script.name, path = %script.path.display(), "running check");
        if !run_script(script, &flag_string, &tee) {
            failed += 1;
        }
    }

    if failed > 0 {
        Err(CliError::execution(format!("{} check(s) failed", failed)))
    } else {
        Ok(())
    }
}

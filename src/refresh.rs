//! Revision-gated cache rebuild fan-out
//!
//! When the package revision changed since the last launch, a fixed set
//! of independent jobs regenerates the per-user platform-integration
//! caches. The jobs write to disjoint locations, so they are spawned
//! concurrently as child processes and joined in one pass. A failing job
//! is logged and never blocks its siblings or the launch; the next
//! revision change rebuilds everything anyway.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, warn};

/// One cache rebuild job: a tool invocation gated on the tool being
/// installed and its input directory existing.
#[derive(Debug, Clone)]
pub struct RefreshJob {
    /// Short name used in log lines.
    pub name: &'static str,
    /// Tool binary, resolved against `PATH` and the extra search dirs.
    pub tool: &'static str,
    pub args: Vec<String>,
    /// Directory that must exist for the job to be worth running.
    pub gate: Option<PathBuf>,
    /// Redirect the tool's stdout into this file (for query tools that
    /// print their cache to stdout).
    pub output: Option<PathBuf>,
}

impl RefreshJob {
    pub fn new(name: &'static str, tool: &'static str) -> Self {
        Self {
            name,
            tool,
            args: Vec::new(),
            gate: None,
            output: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn gated_on(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gate = Some(dir.into());
        self
    }

    pub fn stdout_to(mut self, file: impl Into<PathBuf>) -> Self {
        self.output = Some(file.into());
        self
    }
}

/// Locate `tool` in `PATH`, then in `extra_dirs`. Sandboxed packages
/// commonly ship the GTK tools under their own `usr/bin`.
pub fn find_tool(tool: &str, extra_dirs: &[PathBuf]) -> Option<PathBuf> {
    let path = env::var_os("PATH").unwrap_or_default();
    for dir in env::split_paths(&path).chain(extra_dirs.iter().cloned()) {
        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// The standard job set for a GTK desktop application.
pub fn standard_jobs(
    install_root: &Path,
    triplet: &str,
    data_home: &Path,
    cache_home: &Path,
) -> Vec<RefreshJob> {
    let toolkit_lib = install_root.join("usr/lib").join(triplet);
    vec![
        RefreshJob::new("mime database", "update-mime-database")
            .arg(data_home.join("mime").display().to_string())
            .gated_on(data_home.join("mime")),
        RefreshJob::new("input-method cache", "gtk-query-immodules-3.0")
            .gated_on(toolkit_lib.join("gtk-3.0/3.0.0/immodules"))
            .stdout_to(cache_home.join("immodules/immodules.cache")),
        RefreshJob::new("pixbuf loader cache", "gdk-pixbuf-query-loaders")
            .gated_on(toolkit_lib.join("gdk-pixbuf-2.0/2.10.0/loaders"))
            .stdout_to(cache_home.join("gdk-pixbuf-loaders.cache")),
        RefreshJob::new("gsettings schemas", "glib-compile-schemas")
            .arg(data_home.join("glib-2.0/schemas").display().to_string())
            .gated_on(data_home.join("glib-2.0/schemas")),
        RefreshJob::new("icon cache", "gtk-update-icon-cache")
            .arg("-f")
            .arg(data_home.join("icons/hicolor").display().to_string())
            .gated_on(data_home.join("icons/hicolor")),
    ]
}

fn spawn_job(job: &RefreshJob, extra_dirs: &[PathBuf]) -> Option<Child> {
    if let Some(gate) = &job.gate {
        if !gate.is_dir() {
            debug!("{}: skipped, {} absent", job.name, gate.display());
            return None;
        }
    }
    let Some(tool) = find_tool(job.tool, extra_dirs) else {
        debug!("{}: skipped, {} not installed", job.name, job.tool);
        return None;
    };

    let stdout = match &job.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("{}: cannot create {}: {}", job.name, parent.display(), e);
                    return None;
                }
            }
            match File::create(path) {
                Ok(file) => Stdio::from(file),
                Err(e) => {
                    warn!("{}: cannot open {}: {}", job.name, path.display(), e);
                    return None;
                }
            }
        }
        None => Stdio::null(),
    };

    match Command::new(&tool).args(&job.args).stdout(stdout).spawn() {
        Ok(child) => {
            debug!("{}: started {}", job.name, tool.display());
            Some(child)
        }
        Err(e) => {
            warn!("{}: failed to start {}: {}", job.name, tool.display(), e);
            None
        }
    }
}

/// Spawn every eligible job concurrently, then join them all. Returns
/// the number of jobs that ran and exited non-zero (or could not be
/// waited on); failures are logged, never propagated.
pub fn run_all(jobs: &[RefreshJob], extra_dirs: &[PathBuf]) -> usize {
    let mut running: Vec<(&'static str, Child)> = jobs
        .iter()
        .filter_map(|job| spawn_job(job, extra_dirs).map(|child| (job.name, child)))
        .collect();

    let mut failures = 0;
    for (name, child) in running.iter_mut() {
        match child.wait() {
            Ok(status) if status.success() => debug!("{}: done", name),
            Ok(status) => {
                warn!("{}: exited with {}", name, status);
                failures += 1;
            }
            Err(e) => {
                warn!("{}: wait failed: {}", name, e);
                failures += 1;
            }
        }
    }
    failures
}

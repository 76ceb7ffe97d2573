//! Environment variable set assembled for the launched process
//!
//! Setup steps never mutate the process-wide environment. They record
//! overrides in an [`EnvSet`], which is materialized into the child's
//! environment only at exec time. Lookups fall back to the inherited
//! process environment, so an `EnvSet` always reflects what the launched
//! application will actually see.

use std::env;
use std::path::Path;

/// Toolkit variables whose host values are snapshotted before the
/// preparer overrides them. A confined application (or a nested helper)
/// can read `<NAME>_VANILLA` to recover the host's original setting.
pub const SAVED_VARS: &[&str] = &[
    "GTK_PATH",
    "GTK_EXE_PREFIX",
    "GTK_IM_MODULE_FILE",
    "GDK_PIXBUF_MODULE_FILE",
    "GDK_BACKEND",
];

/// Ordered set of environment overrides layered over the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSet {
    vars: Vec<(String, String)>,
}

impl EnvSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`: overrides first, then the inherited
    /// process environment.
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .or_else(|| env::var(name).ok())
    }

    /// Record an override, replacing any previous one for `name`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.vars.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value;
        } else {
            self.vars.push((name.to_string(), value));
        }
    }

    /// Snapshot the pre-mutation value of `name` under `<NAME>_VANILLA`.
    /// A variable that is unset on the host leaves no snapshot.
    pub fn save_original(&mut self, name: &str) {
        if let Some(value) = self.get(name) {
            self.set(&format!("{}_VANILLA", name), value);
        }
    }

    /// Prepend `dir` to the colon-delimited path list in `var`.
    ///
    /// A candidate containing an unexpanded `$` reference is always added
    /// (its existence cannot be checked until the consumer expands it);
    /// a literal candidate is added only if it exists as a directory.
    pub fn prepend_dir(&mut self, var: &str, dir: &str) {
        self.add_dir(var, dir, true);
    }

    /// Append `dir` to the colon-delimited path list in `var`, with the
    /// same existence-or-deferred rule as [`EnvSet::prepend_dir`].
    pub fn append_dir(&mut self, var: &str, dir: &str) {
        self.add_dir(var, dir, false);
    }

    fn add_dir(&mut self, var: &str, dir: &str, prepend: bool) {
        if !dir.contains('$') && !Path::new(dir).is_dir() {
            return;
        }
        let value = match self.get(var) {
            Some(old) if !old.is_empty() => {
                if prepend {
                    format!("{}:{}", dir, old)
                } else {
                    format!("{}:{}", old, dir)
                }
            }
            _ => dir.to_string(),
        };
        self.set(var, value);
    }

    /// Materialize the full child environment: the inherited process
    /// environment with all overrides applied, in insertion order.
    pub fn materialize(&self) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| !self.vars.iter().any(|(ok, _)| ok == k))
            .collect();
        merged.extend(self.vars.iter().cloned());
        merged
    }

    /// The recorded overrides, in insertion order.
    pub fn overrides(&self) -> &[(String, String)] {
        &self.vars
    }
}

//! Revision marker gating cache regeneration
//!
//! A single `last_revision=<rev>` record under the per-user data
//! directory decides whether the integration caches are rebuilt. The
//! marker is written only after all rebuild jobs have been joined, so a
//! launch interrupted mid-rebuild stays stale and self-heals next time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

const MARKER_FILE: &str = ".last_revision";
const MARKER_KEY: &str = "last_revision";

/// Persisted record of the last revision for which caches were rebuilt
#[derive(Debug, Clone)]
pub struct RevisionMarker {
    path: PathBuf,
}

impl RevisionMarker {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(MARKER_FILE),
        }
    }

    /// The stored revision, or `None` when the marker is absent or
    /// unparseable (both read as "rebuild needed").
    pub fn load(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        contents.lines().find_map(|line| {
            let (key, value) = line.split_once('=')?;
            if key.trim() == MARKER_KEY {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
    }

    /// True when the stored revision differs from `current` or no marker
    /// exists yet.
    pub fn is_stale(&self, current: &str) -> bool {
        self.load().as_deref() != Some(current)
    }

    /// Persist `current` as the rebuilt revision. The write goes through
    /// a temporary file and a rename so readers never see a torn marker.
    pub fn store(&self, current: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, format!("{}={}\n", MARKER_KEY, current))?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

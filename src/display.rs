//! Display-server socket detection
//!
//! A compositor advertises itself as a `wayland-*` Unix socket in the
//! runtime directory. When one is present (and the user has not opted
//! out) the launched application is steered onto the wayland backend.

use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use crate::env::EnvSet;

/// Launch flags appended when the wayland backend is preferred.
pub const WAYLAND_LAUNCH_FLAGS: &[&str] =
    &["--enable-features=UseOzonePlatform", "--ozone-platform=wayland"];

/// Locate a compositor socket (`wayland-*`) in `runtime_dir`.
pub fn wayland_socket(runtime_dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(runtime_dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with("wayland-") || name.ends_with(".lock") {
            continue;
        }
        match entry.file_type() {
            Ok(ft) if ft.is_socket() => return Some(entry.path()),
            _ => continue,
        }
    }
    None
}

/// True when `DISABLE_WAYLAND` opts out of backend selection.
pub fn wayland_disabled(env: &EnvSet) -> bool {
    matches!(
        env.get("DISABLE_WAYLAND").as_deref(),
        Some("1") | Some("true")
    )
}

/// Whether the launch should prefer the wayland backend.
pub fn prefer_wayland(runtime_dir: &Path, env: &EnvSet) -> bool {
    !wayland_disabled(env) && wayland_socket(runtime_dir).is_some()
}

//! Per-user cache/config/data directory setup
//!
//! Every operation here is idempotent: a second launch at the same
//! revision finds all directories in place and does nothing.

use std::fs;
use std::io;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::Path;

use glob::glob;
use log::{debug, warn};

/// Create `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Create `path` with mode 0700. The mode is enforced even when the
/// directory already existed with laxer permissions.
pub fn ensure_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

/// Move the legacy cache directory to its current location.
///
/// Runs only when `old` exists and `new` does not. A failed rename (for
/// example across filesystems) leaves the legacy directory in place and
/// is logged, not propagated.
pub fn migrate_legacy_cache(old: &Path, new: &Path) {
    if !old.is_dir() || new.exists() {
        return;
    }
    if let Some(parent) = new.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("cannot create {}: {}", parent.display(), e);
            return;
        }
    }
    match fs::rename(old, new) {
        Ok(()) => debug!(
            "migrated legacy cache {} -> {}",
            old.display(),
            new.display()
        ),
        Err(e) => warn!("legacy cache migration failed: {}", e),
    }
}

/// Symlink every `*.so` matched by `pattern` into `target_dir`, keeping
/// the original file names. An empty glob is a silent no-op; an existing
/// link is left alone.
pub fn link_modules(pattern: &str, target_dir: &Path) -> io::Result<()> {
    let matches = match glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("bad module glob {}: {}", pattern, e);
            return Ok(());
        }
    };
    fs::create_dir_all(target_dir)?;
    for entry in matches.flatten() {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let link = target_dir.join(name);
        if link.exists() {
            continue;
        }
        if let Err(e) = symlink(&entry, &link) {
            warn!("cannot link {} -> {}: {}", link.display(), entry.display(), e);
        }
    }
    Ok(())
}

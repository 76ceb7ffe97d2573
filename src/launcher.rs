//! Launch orchestration
//!
//! [`LaunchContext::from_env`] resolves the sandbox-provided variables
//! once, [`prepare`] runs the setup steps against an explicit [`EnvSet`]
//! and returns a [`LaunchPlan`], and [`exec`] replaces the process image
//! with the target binary. Nothing before `exec` touches the process
//! environment.

use std::convert::Infallible;
use std::env;
use std::ffi::CString;
use std::path::PathBuf;

use log::{debug, info, warn};
use nix::unistd::execvpe;

use crate::arch;
use crate::dirs;
use crate::display;
use crate::env::{EnvSet, SAVED_VARS};
use crate::error::{LaunchError, Result};
use crate::marker::RevisionMarker;
use crate::refresh;

/// Alternate mount prefix used by some distributions for the package
/// install root; stripped so derived paths match the canonical mount.
const ALT_MOUNT_PREFIX: &str = "/var/lib/snapd";

/// The sandbox-provided variables, resolved once at startup
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Install root of the package (normalized).
    pub install_root: PathBuf,
    /// Per-user writable area, wiped on revision rollback.
    pub user_data: PathBuf,
    /// Per-user writable area shared across revisions.
    pub user_common: PathBuf,
    /// Runtime directory holding compositor sockets.
    pub runtime_dir: PathBuf,
    /// GNU multiarch triplet for the package architecture.
    pub arch_triplet: String,
    /// Current package revision.
    pub revision: String,
}

impl LaunchContext {
    pub fn from_env() -> Result<Self> {
        let install_root = normalize_root(&require("SNAP")?);
        let user_data = PathBuf::from(require("SNAP_USER_DATA")?);
        let user_common = PathBuf::from(require("SNAP_USER_COMMON")?);
        let arch_triplet = arch::triplet(&require("SNAP_ARCH")?);
        let revision = require("SNAP_REVISION")?;
        let runtime_dir = match env::var("XDG_RUNTIME_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(format!("/run/user/{}", nix::unistd::getuid())),
        };
        Ok(Self {
            install_root,
            user_data,
            user_common,
            runtime_dir,
            arch_triplet,
            revision,
        })
    }

    /// Cache home, shared across revisions.
    pub fn cache_home(&self) -> PathBuf {
        self.user_common.join(".cache")
    }

    pub fn config_home(&self) -> PathBuf {
        self.user_data.join(".config")
    }

    pub fn data_home(&self) -> PathBuf {
        self.user_data.join(".local/share")
    }
}

/// Environment overrides plus the argv prepended to the user's arguments
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub env: EnvSet,
    pub extra_args: Vec<String>,
}

fn require(name: &'static str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(LaunchError::MissingVar(name)),
    }
}

fn normalize_root(root: &str) -> PathBuf {
    PathBuf::from(root.strip_prefix(ALT_MOUNT_PREFIX).unwrap_or(root))
}

/// Run every setup step and produce the launch plan.
pub fn prepare(ctx: &LaunchContext) -> Result<LaunchPlan> {
    let mut env = EnvSet::new();
    let root = ctx.install_root.display().to_string();
    let toolkit_lib = format!("{}/usr/lib/{}", root, ctx.arch_triplet);
    let cache_home = ctx.cache_home();
    let data_home = ctx.data_home();

    for name in SAVED_VARS {
        env.save_original(name);
    }

    // Per-user XDG base directories live inside the writable areas.
    env.set("XDG_CACHE_HOME", cache_home.display().to_string());
    env.set("XDG_CONFIG_HOME", ctx.config_home().display().to_string());
    env.set("XDG_DATA_HOME", data_home.display().to_string());
    env.set("XDG_RUNTIME_DIR", ctx.runtime_dir.display().to_string());

    env.prepend_dir("XDG_CONFIG_DIRS", &format!("{}/etc/xdg", root));
    env.append_dir("XDG_CONFIG_DIRS", "/etc/xdg");
    env.prepend_dir("XDG_DATA_DIRS", &format!("{}/usr/share", root));
    env.append_dir("XDG_DATA_DIRS", "/usr/share");

    env.prepend_dir("LOCPATH", &format!("{}/usr/lib/locale", root));
    env.prepend_dir("LIBGL_DRIVERS_PATH", &format!("{}/dri", toolkit_lib));
    env.prepend_dir("GTK_PATH", &format!("{}/gtk-3.0", toolkit_lib));

    // Toolkit cache pointers; the files themselves are regenerated by the
    // refresh jobs when the revision changed.
    let immodules_dir = cache_home.join("immodules");
    env.set("GTK_IM_MODULE_DIR", immodules_dir.display().to_string());
    env.set(
        "GTK_IM_MODULE_FILE",
        immodules_dir.join("immodules.cache").display().to_string(),
    );
    env.set(
        "GDK_PIXBUF_MODULE_FILE",
        cache_home.join("gdk-pixbuf-loaders.cache").display().to_string(),
    );
    env.prepend_dir(
        "GDK_PIXBUF_MODULEDIR",
        &format!("{}/gdk-pixbuf-2.0/2.10.0/loaders", toolkit_lib),
    );
    env.prepend_dir(
        "GSETTINGS_SCHEMA_DIR",
        &data_home.join("glib-2.0/schemas").display().to_string(),
    );

    // Migration must run before the cache home is created, or the rename
    // target would already exist.
    dirs::migrate_legacy_cache(&ctx.user_data.join(".cache"), &cache_home);
    dirs::ensure_dir(&cache_home)?;
    dirs::ensure_dir(&ctx.config_home())?;
    dirs::ensure_dir(&data_home)?;
    dirs::ensure_private_dir(&ctx.runtime_dir)?;
    dirs::ensure_private_dir(&immodules_dir)?;

    dirs::link_modules(
        &format!("{}/gtk-3.0/3.0.0/immodules/*.so", toolkit_lib),
        &immodules_dir,
    )?;

    let mut extra_args = Vec::new();
    if display::prefer_wayland(&ctx.runtime_dir, &env) {
        debug!("compositor socket found, preferring wayland backend");
        env.set("GDK_BACKEND", "wayland");
        extra_args.extend(display::WAYLAND_LAUNCH_FLAGS.iter().map(|f| f.to_string()));
    }

    let marker = RevisionMarker::new(&ctx.user_data);
    if marker.is_stale(&ctx.revision) {
        info!("revision {} is new, refreshing caches", ctx.revision);
        let jobs = refresh::standard_jobs(
            &ctx.install_root,
            &ctx.arch_triplet,
            &data_home,
            &cache_home,
        );
        let failures = refresh::run_all(&jobs, &[ctx.install_root.join("usr/bin")]);
        if failures > 0 {
            warn!("{} cache refresh job(s) failed, continuing", failures);
        }
        marker.store(&ctx.revision)?;
    } else {
        debug!("revision {} already prepared", ctx.revision);
    }

    Ok(LaunchPlan { env, extra_args })
}

/// Replace the current process image with `binary`, passing the plan's
/// synthesized flags ahead of the user's arguments. Only returns on
/// failure to locate or execute the binary.
pub fn exec(plan: &LaunchPlan, binary: &str, args: &[String]) -> Result<Infallible> {
    let program = cstring(binary)?;
    let mut argv = vec![cstring(binary)?];
    for arg in plan.extra_args.iter().chain(args) {
        argv.push(cstring(arg)?);
    }
    let envp: Vec<CString> = plan
        .env
        .materialize()
        .iter()
        .map(|(k, v)| cstring(&format!("{}={}", k, v)))
        .collect::<Result<_>>()?;

    info!("executing {}", binary);
    execvpe(&program, &argv, &envp).map_err(|e| LaunchError::Exec {
        program: binary.to_string(),
        source: e,
    })
}

fn cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| LaunchError::InvalidTarget(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn test_ctx(base: &TempDir) -> LaunchContext {
        LaunchContext {
            install_root: base.path().join("snap/app/42"),
            user_data: base.path().join("user-data"),
            user_common: base.path().join("user-common"),
            runtime_dir: base.path().join("run"),
            arch_triplet: arch::triplet("amd64"),
            revision: "42".to_string(),
        }
    }

    #[test]
    fn alternate_mount_prefix_is_stripped() {
        assert_eq!(
            normalize_root("/var/lib/snapd/snap/app/1"),
            Path::new("/snap/app/1")
        );
        assert_eq!(normalize_root("/snap/app/1"), Path::new("/snap/app/1"));
    }

    #[test]
    fn prepare_points_xdg_homes_at_writable_areas() {
        let base = tempdir().unwrap();
        let ctx = test_ctx(&base);
        let plan = prepare(&ctx).unwrap();

        assert_eq!(
            plan.env.get("XDG_CACHE_HOME").unwrap(),
            ctx.cache_home().display().to_string()
        );
        assert_eq!(
            plan.env.get("XDG_DATA_HOME").unwrap(),
            ctx.data_home().display().to_string()
        );
        assert!(ctx.cache_home().is_dir());
        assert!(ctx.config_home().is_dir());
    }

    #[test]
    fn nonexistent_install_subpaths_are_not_added() {
        let base = tempdir().unwrap();
        let ctx = test_ctx(&base);
        // install_root has no usr/share, so XDG_DATA_DIRS must not gain it
        let plan = prepare(&ctx).unwrap();
        let data_dirs = plan.env.get("XDG_DATA_DIRS").unwrap_or_default();
        assert!(!data_dirs.contains(&ctx.install_root.display().to_string()));
    }

    #[test]
    fn existing_install_subpaths_are_prepended() {
        let base = tempdir().unwrap();
        let ctx = test_ctx(&base);
        fs::create_dir_all(ctx.install_root.join("usr/share")).unwrap();
        let plan = prepare(&ctx).unwrap();
        let data_dirs = plan.env.get("XDG_DATA_DIRS").unwrap();
        let expected = ctx.install_root.join("usr/share").display().to_string();
        assert!(data_dirs.starts_with(expected.as_str()));
    }

    #[test]
    fn no_compositor_means_no_backend_flags() {
        let base = tempdir().unwrap();
        let ctx = test_ctx(&base);
        let plan = prepare(&ctx).unwrap();
        assert!(plan.extra_args.is_empty());
        assert_ne!(plan.env.get("GDK_BACKEND").as_deref(), Some("wayland"));
    }

    #[test]
    fn marker_written_once_and_stable_across_launches() {
        let base = tempdir().unwrap();
        let ctx = test_ctx(&base);

        prepare(&ctx).unwrap();
        let marker = RevisionMarker::new(&ctx.user_data);
        assert_eq!(marker.load().as_deref(), Some("42"));

        prepare(&ctx).unwrap();
        assert_eq!(marker.load().as_deref(), Some("42"));
    }

    #[test]
    fn revision_change_updates_marker() {
        let base = tempdir().unwrap();
        let mut ctx = test_ctx(&base);
        prepare(&ctx).unwrap();

        ctx.revision = "43".to_string();
        prepare(&ctx).unwrap();
        assert_eq!(
            RevisionMarker::new(&ctx.user_data).load().as_deref(),
            Some("43")
        );
    }

    #[test]
    fn legacy_cache_is_migrated_to_common_area() {
        let base = tempdir().unwrap();
        let ctx = test_ctx(&base);
        let legacy = ctx.user_data.join(".cache");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("stamp"), b"x").unwrap();

        prepare(&ctx).unwrap();

        assert!(!legacy.exists());
        assert!(ctx.cache_home().join("stamp").is_file());
    }
}

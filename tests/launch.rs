//! End-to-end preparation flow against a synthetic sandbox layout.
//!
//! Everything lives in one test because `LaunchContext::from_env` reads
//! the process environment, which must not be mutated concurrently.

use std::fs;

use stagehand::marker::RevisionMarker;
use stagehand::{prepare, LaunchContext};
use tempfile::tempdir;

#[test]
fn full_preparation_flow() {
    let base = tempdir().unwrap();
    let install_root = base.path().join("snap/app/7");
    fs::create_dir_all(install_root.join("usr/share")).unwrap();
    fs::create_dir_all(install_root.join("etc/xdg")).unwrap();

    std::env::set_var(
        "SNAP",
        format!("/var/lib/snapd{}", install_root.display()),
    );
    std::env::set_var("SNAP_USER_DATA", base.path().join("user-data"));
    std::env::set_var("SNAP_USER_COMMON", base.path().join("user-common"));
    std::env::set_var("SNAP_ARCH", "amd64");
    std::env::set_var("SNAP_REVISION", "7");
    std::env::set_var("XDG_RUNTIME_DIR", base.path().join("run"));
    std::env::remove_var("DISABLE_WAYLAND");

    let ctx = LaunchContext::from_env().unwrap();

    // The alternate mount prefix is stripped from the install root.
    assert_eq!(ctx.install_root, install_root);
    assert_eq!(ctx.arch_triplet, "x86_64-linux-gnu");
    assert_eq!(ctx.revision, "7");

    let plan = prepare(&ctx).unwrap();

    // Search paths gained the install-root subdirectories that exist.
    let data_dirs = plan.env.get("XDG_DATA_DIRS").unwrap();
    let packaged_share = install_root.join("usr/share").display().to_string();
    assert!(data_dirs.starts_with(packaged_share.as_str()));
    let config_dirs = plan.env.get("XDG_CONFIG_DIRS").unwrap();
    let packaged_xdg = install_root.join("etc/xdg").display().to_string();
    assert!(config_dirs.starts_with(packaged_xdg.as_str()));

    // Per-user directories exist, runtime dir is private.
    assert!(ctx.cache_home().is_dir());
    assert!(ctx.config_home().is_dir());
    assert!(ctx.data_home().is_dir());
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&ctx.runtime_dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    // No compositor socket in the synthetic runtime dir: no backend
    // flags and no wayland variables.
    assert!(plan.extra_args.is_empty());
    assert_ne!(plan.env.get("GDK_BACKEND").as_deref(), Some("wayland"));

    // First launch at this revision rebuilt and stored the marker.
    let marker = RevisionMarker::new(&ctx.user_data);
    assert_eq!(marker.load().as_deref(), Some("7"));

    // A second launch at the same revision changes nothing.
    let marker_file = ctx.user_data.join(".last_revision");
    let before = fs::read(&marker_file).unwrap();
    let plan_again = prepare(&ctx).unwrap();
    assert_eq!(fs::read(&marker_file).unwrap(), before);
    assert_eq!(plan_again.extra_args, plan.extra_args);

    // A revision bump flips the marker to the new revision.
    let mut bumped = ctx.clone();
    bumped.revision = "8".to_string();
    prepare(&bumped).unwrap();
    assert_eq!(marker.load().as_deref(), Some("8"));
}

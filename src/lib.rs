//! stagehand: launch preparation for sandboxed desktop applications
//!
//! A confined desktop application cannot rely on the host's toolkit
//! caches, icon themes, or input-method modules. This crate prepares
//! everything the application needs before it starts:
//!
//! - rewrites XDG and toolkit search-path variables to point into the
//!   package's install root and the per-user writable areas,
//! - creates the per-user cache/config/data directories (migrating the
//!   legacy cache location),
//! - regenerates platform-integration caches when the package revision
//!   changed since the last launch, gated by a persisted revision marker,
//! - detects an available compositor socket and steers the application
//!   onto the wayland backend,
//! - finally replaces the launcher process with the target binary.
//!
//! All environment mutation is collected in an [`env::EnvSet`] and only
//! applied to the child at exec time.

pub mod arch;
pub mod cli;
pub mod dirs;
pub mod display;
pub mod env;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod marker;
pub mod refresh;

pub use error::{LaunchError, Result};
pub use launcher::{exec, prepare, LaunchContext, LaunchPlan};

//! Error types for launch preparation

use std::io;
use thiserror::Error;

/// Result type for launch preparation
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Errors that can occur while preparing or executing a launch
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Failed to execute {program}: {source}")]
    Exec {
        program: String,
        source: nix::Error,
    },

    #[error("Invalid launch target: {0}")]
    InvalidTarget(String),
}

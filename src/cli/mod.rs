//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{BuildArgs, Cli, Commands, DetectArgs};

use crate::error::{ComposerError, ComposerResult};
use std::path::PathBuf;

/// `--working-dir`, or the current directory
pub(crate) fn resolve_working_dir(arg: Option<PathBuf>) -> ComposerResult<PathBuf> {
    match arg {
        Some(dir) => Ok(dir),
        None => std::env::current_dir()
            .map_err(|e| ComposerError::io("getting current directory", e)),
    }
}

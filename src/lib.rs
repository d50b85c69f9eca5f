//! Composer Layer - cached Composer dependencies for buildpack builds
//!
//! Installs an app's Composer packages into a layer keyed on the lock file
//! and stack, reuses it across builds, and links it into the app.

pub mod cache;
pub mod cli;
pub mod composer;
pub mod config;
pub mod detect;
pub mod error;
pub mod layer;
pub mod orchestration;
pub mod pipeline;
pub mod ui;

pub use error::{ComposerError, ComposerResult};

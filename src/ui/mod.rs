//! Build output
//!
//! Buildpacks write progress to stdout for the platform to collect. The
//! log is passed down explicitly so tests can capture it.
//!
//! # Example
//!
//! ```rust,ignore
//! use composer_layer::ui::BuildLog;
//!
//! let log = BuildLog::stdout(config.is_debug());
//! log.title("Composer Layer Buildpack", "0.3.0");
//! log.process("Running 'composer install'");
//! log.debug_subprocess(&output.combined);
//! ```

mod log;

pub use log::BuildLog;
#[cfg(test)]
pub(crate) use log::SharedBuffer;

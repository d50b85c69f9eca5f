//! Build configuration schema
//!
//! Every environment variable the build recognizes maps to one named field.

use std::path::{Path, PathBuf};

/// Names of the environment variables read at the CLI boundary
pub mod vars {
    /// Space-delimited packages for `composer global require`
    pub const INSTALL_GLOBAL: &str = "BP_COMPOSER_INSTALL_GLOBAL";
    /// Option string for `composer install`
    pub const INSTALL_OPTIONS: &str = "BP_COMPOSER_INSTALL_OPTIONS";
    /// Set to `DEBUG` for verbose build output
    pub const LOG_LEVEL: &str = "BP_LOG_LEVEL";
    /// Requested Composer version (detect)
    pub const COMPOSER_VERSION: &str = "BP_COMPOSER_VERSION";
    /// Requested PHP version (detect)
    pub const PHP_VERSION: &str = "BP_PHP_VERSION";
    /// Manifest filename override, relative to the working directory
    pub const COMPOSER: &str = "COMPOSER";
    /// Vendor directory name override
    pub const VENDOR_DIR: &str = "COMPOSER_VENDOR_DIR";
    /// Directory holding PHP extensions, exported by the PHP buildpack
    pub const PHP_EXTENSION_DIR: &str = "PHP_EXTENSION_DIR";
    /// Stack identifier of the build image
    pub const STACK_ID: &str = "CNB_STACK_ID";
    pub const PATH: &str = "PATH";
}

/// Default vendor directory name
pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Log level requested through `BP_LOG_LEVEL`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// Parse the `BP_LOG_LEVEL` value (case-insensitive)
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("debug") {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

/// Build configuration, captured once from the environment
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Packages for the global bootstrap phase (empty = skip the phase)
    pub global_packages: Vec<String>,

    /// Vendor directory name, relative to the working directory
    pub vendor_dir: String,

    /// Raw `BP_COMPOSER_INSTALL_OPTIONS`; `Some("")` differs from `None`
    pub install_options: Option<String>,

    /// Build log verbosity
    pub log_level: LogLevel,

    /// Manifest filename override
    pub composer_file: Option<String>,

    /// Substituted into the generated php.ini
    pub php_extension_dir: String,

    /// Environment identity used as the second cache key component
    pub stack_id: String,

    /// Base PATH for every composer invocation
    pub path: String,

    /// Requested Composer version (detect only)
    pub composer_version: Option<String>,

    /// Requested PHP version (detect only)
    pub php_version: Option<String>,

    /// Snapshot of the process environment, base of every execution
    pub ambient: Vec<(String, String)>,
}

impl BuildConfig {
    /// Whether verbose output was requested
    pub fn is_debug(&self) -> bool {
        self.log_level == LogLevel::Debug
    }

    /// Vendor directory as seen from the project
    pub fn workspace_vendor_dir(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.vendor_dir)
    }
}

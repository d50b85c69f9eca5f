//! Configuration loading for composer-layer
//!
//! The environment is read exactly once, here. Everything downstream works
//! from the resulting [`BuildConfig`].

pub mod schema;

pub use schema::{vars, BuildConfig, LogLevel, DEFAULT_VENDOR_DIR};

use tracing::debug;

impl BuildConfig {
    /// Capture configuration from the process environment
    pub fn from_env() -> Self {
        let ambient: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::from_vars(ambient)
    }

    /// Build configuration from an explicit variable set
    pub fn from_vars(ambient: Vec<(String, String)>) -> Self {
        let lookup = |name: &str| {
            ambient
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        let global_packages = lookup(vars::INSTALL_GLOBAL)
            .map(|list| list.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        let vendor_dir = lookup(vars::VENDOR_DIR)
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_VENDOR_DIR.to_string());

        let config = Self {
            global_packages,
            vendor_dir,
            install_options: lookup(vars::INSTALL_OPTIONS),
            log_level: lookup(vars::LOG_LEVEL)
                .map(|v| LogLevel::parse(&v))
                .unwrap_or_default(),
            composer_file: lookup(vars::COMPOSER),
            php_extension_dir: lookup(vars::PHP_EXTENSION_DIR).unwrap_or_default(),
            stack_id: lookup(vars::STACK_ID).unwrap_or_default(),
            path: lookup(vars::PATH).unwrap_or_default(),
            composer_version: lookup(vars::COMPOSER_VERSION),
            php_version: lookup(vars::PHP_VERSION),
            ambient,
        };

        debug!(
            "Loaded build config: vendor_dir={}, stack={}, global_packages={:?}",
            config.vendor_dir, config.stack_id, config.global_packages
        );
        config
    }
}

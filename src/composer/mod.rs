//! Composer project inputs
//!
//! Small helpers around the project's manifest: where it lives, which
//! options `composer install` gets, and which PHP version it asks for.

pub mod files;
pub mod options;
pub mod php_version;

pub use files::ComposerFiles;
pub use options::{install_options, requires_autoload_dump};
pub use php_version::PhpVersion;

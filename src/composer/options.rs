//! Options for `composer install`
//!
//! <https://getcomposer.org/doc/03-cli.md#install-i>

use tracing::debug;

/// Prevents the autoloader being generated inside the staging layer
pub const NO_AUTOLOADER: &str = "--no-autoloader";

const NO_PROGRESS: &str = "--no-progress";

/// Options for `composer install` from the raw `BP_COMPOSER_INSTALL_OPTIONS`
///
/// - unset: `--no-progress --no-dev --no-autoloader`
/// - empty: `--no-progress`
/// - otherwise: `--no-progress` followed by the value split shell-style;
///   an unterminated quote passes the raw value through as one option
pub fn install_options(raw: Option<&str>) -> Vec<String> {
    let mut options = vec![NO_PROGRESS.to_string()];

    match raw {
        None => {
            options.push("--no-dev".to_string());
            options.push(NO_AUTOLOADER.to_string());
        }
        Some("") => {}
        Some(value) => match shell_words::split(value) {
            Ok(words) => options.extend(words),
            Err(e) => {
                debug!("Passing install options through unsplit: {}", e);
                options.push(value.to_string());
            }
        },
    }

    options
}

/// Whether the installed autoloader must be regenerated after publishing
pub fn requires_autoload_dump(options: &[String]) -> bool {
    options.iter().any(|option| option == NO_AUTOLOADER)
}

//! `composer check-platform-reqs` output handling
//!
//! Input grammar, one requirement per line:
//!
//! ```text
//! <name> <column>* <status>
//! ```
//!
//! Columns are separated by runs of whitespace and the status is always
//! the last column (`success` or `missing`). Lines with fewer than two
//! columns or any other status are ignored.

use crate::error::{ComposerError, ComposerResult};
use std::path::{Path, PathBuf};

/// Exit code `check-platform-reqs` uses when some requirements are unmet
pub const PARTIALLY_UNMET_EXIT_CODE: i32 = 2;

/// Directory, relative to the working directory, read by the PHP runtime
pub const INI_DIR: &str = ".php.ini.d";
/// Generated fragment listing missing extensions
pub const EXTENSIONS_INI: &str = "composer-extensions.ini";

/// Pseudo-requirements describing the runtime itself
const RUNTIME_REQUIREMENTS: [&str; 2] = ["php", "php-64bit"];
const EXTENSION_PREFIX: &str = "ext-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementStatus {
    Satisfied,
    Missing,
}

/// One row of the platform check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequirement {
    pub name: String,
    pub status: RequirementStatus,
}

/// Parse the tabular stdout of `check-platform-reqs`
pub fn parse_requirements(stdout: &str) -> Vec<PlatformRequirement> {
    stdout
        .lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 2 {
                return None;
            }

            let status = match columns[columns.len() - 1] {
                "success" => RequirementStatus::Satisfied,
                "missing" => RequirementStatus::Missing,
                _ => return None,
            };

            Some(PlatformRequirement {
                name: columns[0].to_string(),
                status,
            })
        })
        .collect()
}

/// Extension names (without `ext-`) that are required but missing
pub fn missing_extensions(requirements: &[PlatformRequirement]) -> Vec<String> {
    requirements
        .iter()
        .filter(|req| req.status == RequirementStatus::Missing)
        .filter(|req| !RUNTIME_REQUIREMENTS.contains(&req.name.as_str()))
        .filter_map(|req| req.name.strip_prefix(EXTENSION_PREFIX))
        .map(String::from)
        .collect()
}

/// Render the extensions fragment
pub fn render_extensions_ini(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|name| format!("extension = {}.so\n", name))
        .collect()
}

/// Write `<working_dir>/.php.ini.d/composer-extensions.ini`
pub async fn write_extensions_ini(
    working_dir: &Path,
    extensions: &[String],
) -> ComposerResult<PathBuf> {
    let dir = working_dir.join(INI_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ComposerError::io(format!("creating {}", dir.display()), e))?;

    let path = dir.join(EXTENSIONS_INI);
    tokio::fs::write(&path, render_extensions_ini(extensions))
        .await
        .map_err(|e| ComposerError::io(format!("writing {}", path.display()), e))?;

    Ok(path)
}

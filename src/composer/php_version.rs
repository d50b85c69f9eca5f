//! PHP version requested by the project
//!
//! Composer lists the runtime as a platform package. Priority, highest
//! first:
//! 1. composer.lock `platform.php-64bit`
//! 2. composer.lock `platform.php`
//! 3. composer.json `require.php-64bit`
//! 4. composer.json `require.php`
//!
//! The manifest is only consulted when there is no lock file.

use crate::composer::files::{ComposerFiles, DEFAULT_MANIFEST, LOCK_FILE};
use crate::error::{ComposerError, ComposerResult};
use serde_json::Value;
use std::path::Path;

/// A resolved version constraint and the file it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpVersion {
    pub version: String,
    pub source: String,
}

/// Resolve the PHP version constraint, if the project declares one
pub async fn resolve(files: &ComposerFiles) -> ComposerResult<Option<PhpVersion>> {
    if files.lock.is_file() {
        let lock = read_json(&files.lock).await?;
        return Ok(lookup(&lock, "platform", LOCK_FILE));
    }

    let manifest = read_json(&files.manifest).await?;
    Ok(lookup(&manifest, "require", DEFAULT_MANIFEST))
}

fn lookup(document: &Value, table: &str, source: &str) -> Option<PhpVersion> {
    // An empty platform is serialized as `[]`, which has no keys
    let table = document.get(table)?.as_object()?;

    ["php-64bit", "php"].iter().find_map(|key| {
        table
            .get(*key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(|version| PhpVersion {
                version: version.to_string(),
                source: source.to_string(),
            })
    })
}

async fn read_json(path: &Path) -> ComposerResult<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ComposerError::io(format!("reading {}", path.display()), e))?;

    serde_json::from_str(&content).map_err(|e| ComposerError::ManifestInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use tempfile::TempDir;

    fn files(temp: &TempDir) -> ComposerFiles {
        ComposerFiles::locate(temp.path(), &BuildConfig::default())
    }

    #[tokio::test]
    async fn lock_64bit_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("composer.lock"),
            r#"{"platform": {"php": "^8.0", "php-64bit": "^8.1"}}"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            r#"{"require": {"php": "^7.4"}}"#,
        )
        .unwrap();

        let version = resolve(&files(&temp)).await.unwrap().unwrap();
        assert_eq!(version.version, "^8.1");
        assert_eq!(version.source, "composer.lock");
    }

    #[tokio::test]
    async fn empty_lock_platform_has_no_version() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("composer.lock"), r#"{"platform": []}"#).unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            r#"{"require": {"php": "^7.4"}}"#,
        )
        .unwrap();

        assert_eq!(resolve(&files(&temp)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn manifest_used_without_lock() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            r#"{"require": {"php": ">=8.1"}}"#,
        )
        .unwrap();

        let version = resolve(&files(&temp)).await.unwrap().unwrap();
        assert_eq!(version.version, ">=8.1");
        assert_eq!(version.source, "composer.json");
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("composer.json"), "{").unwrap();

        let result = resolve(&files(&temp)).await;
        assert!(matches!(result, Err(ComposerError::ManifestInvalid { .. })));
    }
}

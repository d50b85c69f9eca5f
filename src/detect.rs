//! Detection: does this app use Composer, and what does it need?
//!
//! Passing detection writes a build plan requiring `composer` and `php`
//! at build time.

use crate::composer::{php_version, ComposerFiles};
use crate::config::{vars, BuildConfig};
use crate::error::{ComposerError, ComposerResult};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Exit code signalling that detection did not pass
pub const DETECT_FAIL_EXIT_CODE: u8 = 100;

/// Build plan written by a passing detection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectPlan {
    pub provides: Vec<Provision>,
    pub requires: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provision {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requirement {
    pub name: String,
    pub metadata: RequirementMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequirementMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "version-source", skip_serializing_if = "Option::is_none")]
    pub version_source: Option<String>,

    pub build: bool,
}

impl Requirement {
    fn build(name: &str) -> Self {
        Self {
            name: name.to_string(),
            metadata: RequirementMetadata {
                build: true,
                ..Default::default()
            },
        }
    }

    fn with_version(mut self, version: String, source: impl Into<String>) -> Self {
        self.metadata.version = Some(version);
        self.metadata.version_source = Some(source.into());
        self
    }
}

impl DetectPlan {
    /// Write the plan as TOML
    pub async fn write(&self, path: &Path) -> ComposerResult<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ComposerError::io(format!("writing build plan {}", path.display()), e))
    }
}

/// Run detection for `working_dir`
pub async fn detect(working_dir: &Path, config: &BuildConfig) -> ComposerResult<DetectPlan> {
    let files = ComposerFiles::locate(working_dir, config);

    if !files.manifest.is_file() {
        let message = match config.composer_file.as_deref() {
            Some(location) => format!("no composer.json found at location '{}'", location),
            None => "no composer.json found".to_string(),
        };
        return Err(ComposerError::DetectFailed(message));
    }
    debug!("Found manifest {}", files.manifest.display());

    let mut composer = Requirement::build("composer");
    if let Some(version) = config.composer_version.clone() {
        composer = composer.with_version(version, vars::COMPOSER_VERSION);
    }

    let mut php = Requirement::build("php");
    if let Some(version) = config.php_version.clone() {
        php = php.with_version(version, vars::PHP_VERSION);
    } else if let Some(resolved) = php_version::resolve(&files).await? {
        debug!(
            "Resolved PHP version {} from {}",
            resolved.version, resolved.source
        );
        php = php.with_version(resolved.version, resolved.source);
    }

    Ok(DetectPlan {
        provides: Vec::new(),
        requires: vec![composer, php],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(pairs: &[(&str, &str)]) -> BuildConfig {
        BuildConfig::from_vars(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn requires_composer_and_php() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("composer.json"), "{}").unwrap();

        let plan = detect(temp.path(), &config(&[])).await.unwrap();

        assert!(plan.provides.is_empty());
        assert_eq!(
            plan.requires,
            vec![Requirement::build("composer"), Requirement::build("php")]
        );
    }

    #[tokio::test]
    async fn missing_manifest_fails() {
        let temp = TempDir::new().unwrap();

        let err = detect(temp.path(), &config(&[])).await.unwrap_err();
        assert_eq!(err.to_string(), "no composer.json found");
    }

    #[tokio::test]
    async fn missing_custom_manifest_names_location() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("composer.json"), "{}").unwrap();

        let err = detect(temp.path(), &config(&[("COMPOSER", "app/composer.json")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ComposerError::DetectFailed(_)));
        assert_eq!(
            err.to_string(),
            "no composer.json found at location 'app/composer.json'"
        );
    }

    #[tokio::test]
    async fn explicit_versions_win() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            r#"{"require": {"php": "^7.4"}}"#,
        )
        .unwrap();

        let plan = detect(
            temp.path(),
            &config(&[("BP_COMPOSER_VERSION", "2.7.1"), ("BP_PHP_VERSION", "8.2.*")]),
        )
        .await
        .unwrap();

        let composer = &plan.requires[0].metadata;
        assert_eq!(composer.version.as_deref(), Some("2.7.1"));
        assert_eq!(composer.version_source.as_deref(), Some("BP_COMPOSER_VERSION"));
        let php = &plan.requires[1].metadata;
        assert_eq!(php.version.as_deref(), Some("8.2.*"));
        assert_eq!(php.version_source.as_deref(), Some("BP_PHP_VERSION"));
    }

    #[tokio::test]
    async fn php_version_from_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            r#"{"require": {"php": ">=8.1"}}"#,
        )
        .unwrap();

        let plan = detect(temp.path(), &config(&[])).await.unwrap();

        let php = &plan.requires[1].metadata;
        assert_eq!(php.version.as_deref(), Some(">=8.1"));
        assert_eq!(php.version_source.as_deref(), Some("composer.json"));
        assert!(php.build);
    }

    #[tokio::test]
    async fn writes_plan_toml() {
        let temp = TempDir::new().unwrap();
        let plan = DetectPlan {
            provides: Vec::new(),
            requires: vec![Requirement::build("composer")
                .with_version("2.7.1".to_string(), "BP_COMPOSER_VERSION")],
        };
        let path = temp.path().join("plan.toml");

        plan.write(&path).await.unwrap();

        let written: toml::Table =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let requires = written["requires"].as_array().unwrap();
        assert_eq!(requires[0]["name"].as_str(), Some("composer"));
        let metadata = requires[0]["metadata"].as_table().unwrap();
        assert_eq!(metadata["version"].as_str(), Some("2.7.1"));
        assert_eq!(metadata["version-source"].as_str(), Some("BP_COMPOSER_VERSION"));
        assert_eq!(metadata["build"].as_bool(), Some(true));
    }
}

//! Buildpack plan parsing and layer type merging
//!
//! The plan handed to `build` lists requirement entries. Entries naming
//! the packages dependency carry `launch`/`build` metadata which, merged,
//! decide where the packages layer is visible.

use crate::error::{ComposerError, ComposerResult};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Plan entry name whose metadata drives the packages layer types
pub const PACKAGES_DEPENDENCY: &str = "composer-packages";

/// Resolved buildpack plan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildpackPlan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

/// One requirement entry
#[derive(Debug, Clone, Deserialize)]
pub struct PlanEntry {
    pub name: String,

    #[serde(default)]
    pub metadata: toml::Table,
}

impl PlanEntry {
    fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Merged `(launch, build)` pair requested by the plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerTypeRequest {
    pub launch: bool,
    pub build: bool,
}

impl BuildpackPlan {
    /// Load the plan file; a missing file is an empty plan
    pub async fn load(path: &Path) -> ComposerResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No buildpack plan at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ComposerError::io(
                    format!("reading buildpack plan {}", path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| ComposerError::PlanInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Merge the layer types requested by every entry called `name`.
    ///
    /// A flag is set when any matching entry sets it.
    pub fn merge_layer_types(&self, name: &str) -> LayerTypeRequest {
        self.entries
            .iter()
            .filter(|entry| entry.name == name)
            .fold(LayerTypeRequest::default(), |acc, entry| LayerTypeRequest {
                launch: acc.launch || entry.flag("launch"),
                build: acc.build || entry.flag("build"),
            })
    }
}

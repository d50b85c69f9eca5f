//! Layer metadata files
//!
//! Each layer has a `<name>.toml` sibling of its directory holding the
//! visibility flags and a free-form metadata table.

use crate::error::{ComposerError, ComposerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Visibility flags of a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTypes {
    /// Included in the runtime image
    pub launch: bool,

    /// Visible to later build steps
    pub build: bool,

    /// Persisted across builds
    pub cache: bool,
}

/// Parsed `<name>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRecord {
    pub types: LayerTypes,
    pub metadata: toml::Table,
}

impl LayerRecord {
    /// Load a record from disk.
    ///
    /// A missing, unreadable or malformed file reads as an empty record:
    /// the layer is treated as never having been built.
    pub async fn load(path: &Path) -> Self {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No layer metadata at {}", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Ignoring unreadable layer metadata {}: {}", path.display(), e);
                return Self::default();
            }
        };

        Self::parse(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed layer metadata {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Parse a record from TOML
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Write the record to disk
    pub async fn save(&self, path: &Path) -> ComposerResult<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await.map_err(|e| {
            ComposerError::io(format!("writing layer metadata {}", path.display()), e)
        })
    }
}

//! Build layers
//!
//! A layer is a build-owned directory under the layers root plus a
//! `<name>.toml` record. The packages layer is cached between builds; the
//! global and php.ini layers are rebuilt every time.

pub mod manifest;
pub mod plan;

pub use manifest::{LayerRecord, LayerTypes};
pub use plan::{BuildpackPlan, LayerTypeRequest, PlanEntry, PACKAGES_DEPENDENCY};

use crate::error::{ComposerError, ComposerResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cached staging area for installed packages
pub const PACKAGES_LAYER: &str = "composer-packages";
/// Always-reset staging area for `composer global require`
pub const GLOBAL_LAYER: &str = "composer-global";
/// Never-cached layer holding the generated php.ini
pub const PHP_INI_LAYER: &str = "composer-php-ini";

/// Root directory containing all layers
#[derive(Debug, Clone)]
pub struct Layers {
    path: PathBuf,
}

impl Layers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a layer by name, loading its record if one exists
    pub async fn get(&self, name: &str) -> ComposerResult<Layer> {
        let layer_path = self.path.join(name);
        let record = LayerRecord::load(&record_path(&self.path, name)).await;
        debug!("Loaded layer {} from {}", name, layer_path.display());

        Ok(Layer {
            name: name.to_string(),
            path: layer_path,
            root: self.path.clone(),
            types: record.types,
            metadata: record.metadata,
        })
    }
}

fn record_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}.toml", name))
}

/// A single layer
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
    root: PathBuf,
    pub types: LayerTypes,
    pub metadata: toml::Table,
}

impl Layer {
    /// Destructively clear the layer directory and its record.
    ///
    /// Returns the emptied layer with an empty directory in place.
    pub async fn reset(self) -> ComposerResult<Self> {
        debug!("Resetting layer {}", self.path.display());

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ComposerError::io(
                    format!("removing layer {}", self.path.display()),
                    e,
                ))
            }
        }

        let record = self.record_path();
        match tokio::fs::remove_file(&record).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ComposerError::io(
                    format!("removing layer metadata {}", record.display()),
                    e,
                ))
            }
        }

        tokio::fs::create_dir_all(&self.path).await.map_err(|e| {
            ComposerError::io(format!("creating layer {}", self.path.display()), e)
        })?;

        Ok(Self {
            types: LayerTypes::default(),
            metadata: toml::Table::new(),
            ..self
        })
    }

    /// String value of a metadata key
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(toml::Value::as_str)
    }

    /// Write flags and metadata to `<name>.toml`
    pub async fn save(&self) -> ComposerResult<()> {
        let record = LayerRecord {
            types: self.types,
            metadata: self.metadata.clone(),
        };
        record.save(&self.record_path()).await
    }

    fn record_path(&self) -> PathBuf {
        record_path(&self.root, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn get_missing_layer_is_empty() {
        let temp = TempDir::new().unwrap();
        let layers = Layers::new(temp.path());

        let layer = layers.get(PACKAGES_LAYER).await.unwrap();
        assert_eq!(layer.path, temp.path().join("composer-packages"));
        assert!(layer.metadata.is_empty());
        assert_eq!(layer.types, LayerTypes::default());
    }

    #[tokio::test]
    async fn reset_clears_content_and_record() {
        let temp = TempDir::new().unwrap();
        let layers = Layers::new(temp.path());
        std::fs::create_dir_all(temp.path().join("composer-packages/vendor")).unwrap();
        std::fs::write(temp.path().join("composer-packages/vendor/file.txt"), "").unwrap();
        std::fs::write(
            temp.path().join("composer-packages.toml"),
            "[metadata]\ncomposer-lock-sha = \"abc\"\n",
        )
        .unwrap();

        let layer = layers.get(PACKAGES_LAYER).await.unwrap();
        assert_eq!(layer.metadata_str("composer-lock-sha"), Some("abc"));

        let layer = layer.reset().await.unwrap();
        assert!(layer.metadata.is_empty());
        assert!(layer.path.is_dir());
        assert!(!layer.path.join("vendor").exists());
        assert!(!temp.path().join("composer-packages.toml").exists());
    }

    #[tokio::test]
    async fn save_round_trips_through_get() {
        let temp = TempDir::new().unwrap();
        let layers = Layers::new(temp.path());

        let mut layer = layers.get(GLOBAL_LAYER).await.unwrap().reset().await.unwrap();
        layer.types.build = true;
        layer
            .metadata
            .insert("key".to_string(), toml::Value::String("value".to_string()));
        layer.save().await.unwrap();

        let reloaded = layers.get(GLOBAL_LAYER).await.unwrap();
        assert!(reloaded.types.build);
        assert_eq!(reloaded.metadata_str("key"), Some("value"));
    }
}

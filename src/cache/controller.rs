//! Reuse-or-rebuild decisions for the packages layer
//!
//! The cache key is the lockfile fingerprint plus the stack the layer was
//! built on. Layer visibility flags are not part of the key and are
//! recomputed on every run.

use crate::cache::fingerprint::Fingerprint;
use crate::error::ComposerResult;
use crate::layer::{Layer, LayerTypeRequest, LayerTypes};
use std::fmt;
use tracing::debug;

/// Metadata keys stored in the packages layer record
pub mod keys {
    /// Fingerprint of composer.lock
    pub const LOCK_SHA: &str = "composer-lock-sha";
    /// Stack the layer content was produced on
    pub const STACK: &str = "stack";
}

/// Outcome of comparing a layer's stored key with the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// Stored key matches, keep the layer content as is
    Reuse,
    /// Missing or stale key, reset and reinstall
    Rebuild,
}

impl fmt::Display for CacheDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse => write!(f, "reuse"),
            Self::Rebuild => write!(f, "rebuild"),
        }
    }
}

/// Fingerprint and environment identity, compared together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub fingerprint: Fingerprint,
    pub stack: String,
}

impl CacheKey {
    pub fn new(fingerprint: Fingerprint, stack: impl Into<String>) -> Self {
        Self {
            fingerprint,
            stack: stack.into(),
        }
    }

    /// Read the key stored in a layer, if both fields are present
    pub fn stored_in(layer: &Layer) -> Option<Self> {
        let sha = layer.metadata_str(keys::LOCK_SHA)?;
        let stack = layer.metadata_str(keys::STACK)?;
        Some(Self::new(Fingerprint::from_digest(sha), stack))
    }
}

/// Decide whether the layer content can be reused for `current`
pub fn decide(layer: &Layer, current: &CacheKey) -> CacheDecision {
    match CacheKey::stored_in(layer) {
        Some(stored) if stored == *current => CacheDecision::Reuse,
        Some(stored) => {
            if stored.fingerprint != current.fingerprint {
                debug!(
                    "Lockfile changed: {} -> {}",
                    stored.fingerprint, current.fingerprint
                );
            }
            if stored.stack != current.stack {
                debug!("Stack changed: '{}' -> '{}'", stored.stack, current.stack);
            }
            CacheDecision::Rebuild
        }
        None => {
            debug!("No cache key stored in layer {}", layer.name);
            CacheDecision::Rebuild
        }
    }
}

/// Visibility flags for a type request.
///
/// `cache` follows `build`: content is worth keeping only when it feeds a
/// later build.
pub fn layer_types(request: LayerTypeRequest) -> LayerTypes {
    LayerTypes {
        launch: request.launch,
        build: request.build,
        cache: request.build,
    }
}

/// Clear the layer for a rebuild
pub async fn reset(layer: Layer) -> ComposerResult<Layer> {
    layer.reset().await
}

/// Record the new key and write the layer record
pub async fn persist(layer: &mut Layer, key: &CacheKey) -> ComposerResult<()> {
    layer.metadata.insert(
        keys::LOCK_SHA.to_string(),
        toml::Value::String(key.fingerprint.to_string()),
    );
    layer
        .metadata
        .insert(keys::STACK.to_string(), toml::Value::String(key.stack.clone()));
    layer.save().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Layers, PACKAGES_LAYER};
    use tempfile::TempDir;

    async fn layer_with(temp: &TempDir, record: &str) -> Layer {
        std::fs::write(temp.path().join("composer-packages.toml"), record).unwrap();
        Layers::new(temp.path()).get(PACKAGES_LAYER).await.unwrap()
    }

    fn key(sha: &str, stack: &str) -> CacheKey {
        CacheKey::new(Fingerprint::from_digest(sha), stack)
    }

    #[tokio::test]
    async fn matching_key_reuses() {
        let temp = TempDir::new().unwrap();
        let layer = layer_with(&temp, "[metadata]\ncomposer-lock-sha = \"F\"\nstack = \"E\"\n").await;
        assert_eq!(decide(&layer, &key("F", "E")), CacheDecision::Reuse);
    }

    #[tokio::test]
    async fn fingerprint_drift_rebuilds() {
        let temp = TempDir::new().unwrap();
        let layer = layer_with(&temp, "[metadata]\ncomposer-lock-sha = \"F\"\nstack = \"E\"\n").await;
        assert_eq!(decide(&layer, &key("G", "E")), CacheDecision::Rebuild);
    }

    #[tokio::test]
    async fn stack_drift_rebuilds() {
        let temp = TempDir::new().unwrap();
        let layer = layer_with(&temp, "[metadata]\ncomposer-lock-sha = \"F\"\nstack = \"E\"\n").await;
        assert_eq!(decide(&layer, &key("F", "other")), CacheDecision::Rebuild);
    }

    #[tokio::test]
    async fn missing_stack_field_rebuilds() {
        let temp = TempDir::new().unwrap();
        let layer = layer_with(&temp, "[metadata]\ncomposer-lock-sha = \"F\"\n").await;
        assert_eq!(decide(&layer, &key("F", "")), CacheDecision::Rebuild);
    }

    #[tokio::test]
    async fn first_build_rebuilds() {
        let temp = TempDir::new().unwrap();
        let layer = Layers::new(temp.path()).get(PACKAGES_LAYER).await.unwrap();
        assert_eq!(decide(&layer, &key("F", "E")), CacheDecision::Rebuild);
    }

    #[test]
    fn cache_follows_build() {
        let types = layer_types(LayerTypeRequest {
            launch: true,
            build: false,
        });
        assert!(types.launch);
        assert!(!types.build);
        assert!(!types.cache);

        let types = layer_types(LayerTypeRequest {
            launch: false,
            build: true,
        });
        assert!(types.cache);
    }

    #[tokio::test]
    async fn persist_then_decide_reuses() {
        let temp = TempDir::new().unwrap();
        let layers = Layers::new(temp.path());
        let current = key("abc", "jammy");

        let mut layer = reset(layers.get(PACKAGES_LAYER).await.unwrap()).await.unwrap();
        persist(&mut layer, &current).await.unwrap();

        let reloaded = layers.get(PACKAGES_LAYER).await.unwrap();
        assert_eq!(decide(&reloaded, &current), CacheDecision::Reuse);
    }
}

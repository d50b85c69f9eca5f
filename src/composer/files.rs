//! Manifest and lock file locations

use crate::config::BuildConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST: &str = "composer.json";
pub const LOCK_FILE: &str = "composer.lock";

/// Where the project's Composer files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerFiles {
    /// `composer.json`, or `$COMPOSER` relative to the working directory
    pub manifest: PathBuf,
    /// `composer.lock` next to the manifest; may not exist
    pub lock: PathBuf,
}

impl ComposerFiles {
    /// Locate the files for a working directory
    pub fn locate(working_dir: &Path, config: &BuildConfig) -> Self {
        let manifest = match config.composer_file.as_deref() {
            Some(name) if !name.is_empty() => normalize(&working_dir.join(name)),
            _ => working_dir.join(DEFAULT_MANIFEST),
        };

        let lock = manifest
            .parent()
            .unwrap_or(working_dir)
            .join(LOCK_FILE);

        Self { manifest, lock }
    }

    /// Paths to fingerprint: the lock file if present, else nothing
    pub fn fingerprint_inputs(&self) -> Vec<PathBuf> {
        if self.lock.is_file() {
            vec![self.lock.clone()]
        } else {
            Vec::new()
        }
    }
}

/// Drop `.` components so `./foo/bar.json` reads cleanly in env vars
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

//! State threaded through the install phases
//!
//! Each phase takes the context by value and returns the updated one, so
//! what a later phase sees is exactly what earlier phases produced.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    /// Project root
    pub working_dir: PathBuf,
    /// Base PATH from the build environment
    pub base_path: String,
    /// Generated php.ini, set by the platform config phase
    pub php_ini: Option<PathBuf>,
    /// `vendor/bin` of the global bootstrap, prepended to PATH when set
    pub global_bin: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(working_dir: impl Into<PathBuf>, base_path: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            base_path: base_path.into(),
            php_ini: None,
            global_bin: None,
        }
    }

    pub fn with_php_ini(self, php_ini: PathBuf) -> Self {
        Self {
            php_ini: Some(php_ini),
            ..self
        }
    }

    pub fn with_global_bin(self, global_bin: PathBuf) -> Self {
        Self {
            global_bin: Some(global_bin),
            ..self
        }
    }

    /// PATH prefix contributed by earlier phases
    pub fn path_prefix(&self) -> Option<&Path> {
        self.global_bin.as_deref()
    }

    /// Value for `PHPRC`
    pub fn phprc(&self) -> String {
        self.php_ini
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

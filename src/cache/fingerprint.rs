//! Lockfile fingerprinting for the packages layer cache
//!
//! Same lock file bytes = same fingerprint = cached layer reused.

use crate::error::{ComposerError, ComposerResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Content-derived identity of one or more files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a digest previously read back from layer metadata
    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calculates a checksum over a set of files
pub trait Calculator: Send + Sync {
    fn sum(&self, paths: &[PathBuf]) -> ComposerResult<Fingerprint>;
}

/// SHA256 over each file's digest, in argument order
///
/// Every path must be readable; a missing file is an error, not an empty
/// input. An empty path list yields the digest of nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Calculator;

impl Calculator for Sha256Calculator {
    fn sum(&self, paths: &[PathBuf]) -> ComposerResult<Fingerprint> {
        let mut outer = Sha256::new();

        for path in paths {
            outer.update(hash_file_contents(path)?);
        }

        let digest = hex::encode(outer.finalize());
        debug!("Fingerprint over {} file(s): {}", paths.len(), digest);
        Ok(Fingerprint(digest))
    }
}

fn hash_file_contents(path: &Path) -> ComposerResult<Vec<u8>> {
    let contents = std::fs::read(path)
        .map_err(|e| ComposerError::io(format!("reading {}", path.display()), e))?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hasher.finalize().to_vec())
}

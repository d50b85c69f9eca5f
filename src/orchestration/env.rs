//! Execution environment composition
//!
//! Every composer phase runs with the ambient environment plus a
//! phase-specific set of variables. Overrides replace ambient values in
//! place; new keys are appended. The result never holds a key twice.

use std::path::Path;

/// Suppresses interactive prompts; the build runs unattended
pub const NO_INTERACTION: (&str, &str) = ("COMPOSER_NO_INTERACTION", "1");

#[cfg(unix)]
const PATH_LIST_SEPARATOR: char = ':';
#[cfg(not(unix))]
const PATH_LIST_SEPARATOR: char = ';';

/// Prepend `dir` to a PATH-style list
pub fn prepend_path(dir: &Path, path: &str) -> String {
    let dir = dir.to_string_lossy();
    if path.is_empty() {
        dir.into_owned()
    } else {
        format!("{}{}{}", dir, PATH_LIST_SEPARATOR, path)
    }
}

/// Builder for the variable list of one execution
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder<'a> {
    ambient: &'a [(String, String)],
    overrides: Vec<(String, String)>,
}

impl<'a> EnvironmentBuilder<'a> {
    /// Start from the ambient variable set
    pub fn new(ambient: &'a [(String, String)]) -> Self {
        Self {
            ambient,
            overrides: Vec::new(),
        }
    }

    /// Add or replace a variable
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }

    /// Set PATH to `base`, with `prefix` in front when an earlier phase
    /// contributed one
    pub fn path(self, base: &str, prefix: Option<&Path>) -> Self {
        let value = match prefix {
            Some(dir) => prepend_path(dir, base),
            None => base.to_string(),
        };
        self.var("PATH", value)
    }

    /// Flatten ambient and overrides; later values win
    pub fn build(self) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = Vec::with_capacity(self.ambient.len() + 8);

        let forced = (NO_INTERACTION.0.to_string(), NO_INTERACTION.1.to_string());
        let all = self
            .ambient
            .iter()
            .cloned()
            .chain(self.overrides)
            .chain(std::iter::once(forced));

        for (name, value) in all {
            match env.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => env.push((name, value)),
            }
        }

        env
    }
}

//! Subprocess execution
//!
//! The runner only distinguishes success from failure. Which exit codes a
//! phase tolerates is decided by the caller.

use crate::error::{ComposerError, ComposerResult};
use crate::orchestration::stream_child_output;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Name of the external tool every phase invokes
pub const COMPOSER: &str = "composer";

/// One invocation of the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Arguments after the program name
    pub args: Vec<String>,
    /// Working directory
    pub dir: PathBuf,
    /// Complete variable set; nothing is inherited beyond this
    pub env: Vec<(String, String)>,
}

impl Execution {
    /// Value of a variable in this execution's environment
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `composer <args...>`, for log lines and errors
    pub fn command_line(&self) -> String {
        std::iter::once(COMPOSER)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output captured from one execution, owned by the caller
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Standard output only, for phases that parse it
    pub stdout: String,
    /// Standard output and error interleaved as they arrived
    pub combined: String,
}

impl ProcessOutput {
    pub fn push_stdout(&mut self, line: &str) {
        self.stdout.push_str(line);
        self.stdout.push('\n');
        self.combined.push_str(line);
        self.combined.push('\n');
    }

    pub fn push_stderr(&mut self, line: &str) {
        self.combined.push_str(line);
        self.combined.push('\n');
    }
}

/// Runs the tool
#[async_trait]
pub trait Executable: Send + Sync {
    /// Run to completion, capturing output into `output`.
    ///
    /// Any non-zero exit is returned as [`ComposerError::ToolExit`].
    async fn execute(&self, execution: &Execution, output: &mut ProcessOutput)
        -> ComposerResult<()>;
}

/// Runs the real `composer` binary, resolved through the execution's PATH
#[derive(Debug, Clone)]
pub struct ComposerExecutable {
    program: String,
}

impl ComposerExecutable {
    pub fn new() -> Self {
        Self {
            program: COMPOSER.to_string(),
        }
    }

    /// Use a different program name or path
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ComposerExecutable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executable for ComposerExecutable {
    async fn execute(
        &self,
        execution: &Execution,
        output: &mut ProcessOutput,
    ) -> ComposerResult<()> {
        let command_line = execution.command_line();
        debug!("Executing: {} in {}", command_line, execution.dir.display());

        let mut child = Command::new(&self.program)
            .args(&execution.args)
            .current_dir(&execution.dir)
            .env_clear()
            .envs(execution.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ComposerError::command_failed(&command_line, e))?;

        stream_child_output(&mut child, output).await?;

        let status = child
            .wait()
            .await
            .map_err(|e| ComposerError::command_failed(&command_line, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(ComposerError::ToolExit {
                command: command_line,
                code: status.code(),
            })
        }
    }
}

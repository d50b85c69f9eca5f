//! Orchestration of composer subprocesses
//!
//! - [`env`]: per-phase variable sets
//! - [`runner`]: spawning the tool and capturing its output

pub mod env;
pub mod runner;

pub use env::{prepend_path, EnvironmentBuilder, NO_INTERACTION};
pub use runner::{ComposerExecutable, Executable, Execution, ProcessOutput, COMPOSER};

use crate::error::{ComposerError, ComposerResult};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Stream stdout+stderr from a child process into `output`.
///
/// Lines are recorded in arrival order in the combined buffer; stdout
/// lines are also kept separately. Bytes that are not valid UTF-8 are
/// replaced, never dropped. Both pipes are drained to EOF.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    output: &mut ProcessOutput,
) -> ComposerResult<()> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ComposerError::Internal("child stderr was not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ComposerError::Internal("child stdout was not piped".to_string()))?;

    let mut stderr_reader = BufReader::new(stderr).split(b'\n');
    let mut stdout_reader = BufReader::new(stdout).split(b'\n');

    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            segment = stderr_reader.next_segment(), if !stderr_done => {
                match segment.map_err(|e| ComposerError::io("reading child stderr", e))? {
                    Some(bytes) => output.push_stderr(&decode_line(&bytes)),
                    None => stderr_done = true,
                }
            }
            segment = stdout_reader.next_segment(), if !stdout_done => {
                match segment.map_err(|e| ComposerError::io("reading child stdout", e))? {
                    Some(bytes) => output.push_stdout(&decode_line(&bytes)),
                    None => stdout_done = true,
                }
            }
        }
    }

    Ok(())
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

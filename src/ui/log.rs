//! Build log output
//!
//! Buildpack output is read in CI logs, so everything is plain indented
//! text. Four levels: title, process, subprocess, detail.

use console::style;
use std::io::Write;
use std::sync::{Arc, Mutex};

const PROCESS_INDENT: &str = "  ";
const SUBPROCESS_INDENT: &str = "    ";
const DETAIL_INDENT: &str = "      ";

/// Writer behind a build log
type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Leveled, indented build output
#[derive(Clone)]
pub struct BuildLog {
    sink: Sink,
    debug: bool,
}

impl BuildLog {
    /// Log to an arbitrary writer
    pub fn new(writer: impl Write + Send + 'static, debug: bool) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
            debug,
        }
    }

    /// Log to stdout
    pub fn stdout(debug: bool) -> Self {
        Self::new(std::io::stdout(), debug)
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    fn write_lines(&self, indent: &str, text: &str) {
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        for line in text.lines() {
            // Build output is best effort; a closed pipe must not fail the build
            let _ = writeln!(sink, "{}{}", indent, line);
        }
    }

    /// Buildpack name and version
    pub fn title(&self, name: &str, version: &str) {
        self.write_lines("", &format!("{} {}", style(name).bold(), version));
    }

    pub fn process(&self, message: &str) {
        self.write_lines(PROCESS_INDENT, message);
    }

    pub fn subprocess(&self, message: &str) {
        self.write_lines(SUBPROCESS_INDENT, message);
    }

    pub fn detail(&self, message: &str) {
        self.write_lines(DETAIL_INDENT, message);
    }

    /// Blank separator line
    pub fn line_break(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink);
        }
    }

    pub fn debug_process(&self, message: &str) {
        if self.debug {
            self.process(message);
        }
    }

    pub fn debug_subprocess(&self, message: &str) {
        if self.debug {
            self.subprocess(message);
        }
    }

    pub fn debug_detail(&self, message: &str) {
        if self.debug {
            self.detail(message);
        }
    }
}

/// In-memory writer whose contents can be read back
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut inner) => inner.write(buf),
            Err(_) => Err(std::io::Error::other("log buffer poisoned")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

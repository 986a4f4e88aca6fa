//! Build log written to a byte stream (stdout in production).

use std::io::{self, Write};
use std::sync::Mutex;

use updater::BuildLog;

/// Writes each log line, newline-terminated, to the wrapped writer.
///
/// Write errors (for example a closed pipe) are dropped; the build log is
/// best-effort and must never abort the step.
pub struct WriterBuildLog<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterBuildLog<W> {
    /// Wraps `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterBuildLog<io::Stdout> {
    /// A log on the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> BuildLog for WriterBuildLog<W> {
    fn line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(out, "{line}").and_then(|()| out.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_newline_terminated() {
        let log = WriterBuildLog::new(Vec::new());
        log.line("[Jira] Failed to update issue A-1");
        log.line("Issue Does Not Exist");
        let written = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(written, "[Jira] Failed to update issue A-1\nIssue Does Not Exist\n");
    }
}

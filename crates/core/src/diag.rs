//! Buffered diagnostic log shared by every pipeline stage.
//!
//! There is no global logger. Stages that can emit diagnostics take an
//! `Option<&mut Log>` parameter, so tests can run any stage without a sink
//! and parallel test processes never interfere with each other.

use serde::Serialize;
use std::fmt;

/// Severity of a single log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Notice => write!(f, "notice"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub severity: Severity,
    pub message: String,
}

/// Buffered diagnostic log.
///
/// Entries accumulate in order; [`Log::has_errors`] reports whether any
/// error-severity entry was recorded. The `Display` rendering is one line
/// per entry, suitable for a single aggregate failure message.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Log {
    entries: Vec<Entry>,
}

impl Log {
    pub fn new() -> Self {
        Log::default()
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.push(Severity::Notice, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.entries.push(Entry {
            severity,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", entry.severity, entry.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_entries_in_order() {
        let mut log = Log::new();
        log.notice("first");
        log.warning("second");
        assert_eq!(log.entries().len(), 2);
        assert!(!log.has_errors());
        assert_eq!(log.to_string(), "notice: first\nwarning: second");
    }

    #[test]
    fn has_errors_tracks_severity() {
        let mut log = Log::new();
        log.warning("just a warning");
        assert!(!log.has_errors());
        log.error("broken");
        assert!(log.has_errors());
    }
}

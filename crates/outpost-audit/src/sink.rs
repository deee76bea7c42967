//! Audit sinks.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};

/// Destination for completed audit entries.
///
/// Implementations must be thread-safe; entries arrive concurrently from
/// every in-flight request. A sink failure is the caller's to log, never a
/// reason to fail the request it describes.
pub trait AuditSink: Send + Sync {
    /// Record one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be persisted.
    fn record(&self, entry: &AuditEntry) -> AuditResult<()>;
}

/// The production sink: a one-line summary on the `audit` tracing target,
/// plus a JSON line appended to the configured file when one is set.
pub struct AuditLog {
    file: Option<Mutex<File>>,
}

impl AuditLog {
    /// Create a sink that only emits tracing summaries.
    #[must_use]
    pub fn stderr_only() -> Self {
        Self { file: None }
    }

    /// Create a sink that also appends JSON lines to `path`.
    ///
    /// The file is created if absent and always appended to.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] if the file cannot be opened.
    pub fn with_file(path: impl AsRef<Path>) -> AuditResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Some(Mutex::new(file)),
        })
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        info!(target: "audit", "{}", entry.summary());

        if let Some(file) = &self.file {
            let line = serde_json::to_string(entry)?;
            let mut file = file.lock().map_err(|_| {
                AuditError::Io(std::io::Error::other("audit log lock poisoned"))
            })?;
            writeln!(file, "{line}")?;
            file.flush()?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("has_file", &self.file.is_some())
            .finish()
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        self.entries
            .lock()
            .map_err(|_| AuditError::Io(std::io::Error::other("audit sink lock poisoned")))?
            .push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditAction;
    use outpost_core::AgentIdentity;

    fn entry(action: AuditAction) -> AuditEntry {
        AuditEntry::new(
            &AgentIdentity::new("agent@example.com"),
            action,
            "allow-list",
            "api.github.com",
            "GET",
            "/repos/x",
        )
    }

    #[test]
    fn test_file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let sink = AuditLog::with_file(&path).unwrap();
        sink.record(&entry(AuditAction::Allow)).unwrap();
        sink.record(&entry(AuditAction::Deny)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, AuditAction::Allow);
        let second: AuditEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.action, AuditAction::Deny);
    }

    #[test]
    fn test_file_sink_appends_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        AuditLog::with_file(&path)
            .unwrap()
            .record(&entry(AuditAction::Allow))
            .unwrap();
        AuditLog::with_file(&path)
            .unwrap()
            .record(&entry(AuditAction::Allow))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_stderr_only_sink_accepts_entries() {
        let sink = AuditLog::stderr_only();
        sink.record(&entry(AuditAction::GrantApproved)).unwrap();
    }

    #[test]
    fn test_memory_sink_captures_entries() {
        let sink = MemoryAuditSink::new();
        assert!(sink.is_empty());
        sink.record(&entry(AuditAction::Allow)).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].action, AuditAction::Allow);
    }
}

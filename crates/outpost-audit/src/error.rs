use thiserror::Error;

/// Errors that can occur while recording audit entries.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The audit log file could not be opened or written.
    #[error("audit log i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialized.
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

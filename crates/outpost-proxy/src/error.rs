use thiserror::Error;

/// Errors internal to request handling and gateway startup.
///
/// Per-request errors never escape the orchestrator; they are converted into
/// exactly one HTTP response plus one audit record at the boundary.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The inbound path does not decode to an absolute http(s) target URL.
    #[error("invalid target URL: {reason}")]
    InvalidTarget {
        /// Why the target was rejected.
        reason: String,
    },

    /// The upstream call failed (connect, TLS, or body read).
    #[error("upstream request failed: {reason}")]
    Upstream {
        /// Transport failure description.
        reason: String,
    },

    /// The gateway could not start (bind failure, client construction).
    #[error("gateway startup failed: {reason}")]
    Startup {
        /// What went wrong.
        reason: String,
    },
}

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

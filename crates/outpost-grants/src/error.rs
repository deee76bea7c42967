use thiserror::Error;

/// Errors from the grant broker protocol.
#[derive(Debug, Error)]
pub enum GrantError {
    /// The broker could not be reached, refused the call, or answered with
    /// something that does not decode as a grant.
    #[error("grant broker unavailable: {reason}")]
    BrokerUnavailable {
        /// Transport or protocol failure description.
        reason: String,
    },

    /// The grant did not reach a terminal status before the deadline.
    #[error("grant approval timed out after {timeout_ms}ms")]
    Timeout {
        /// The configured wait budget, in milliseconds.
        timeout_ms: u64,
    },
}

/// Result type for grant broker operations.
pub type GrantResult<T> = Result<T, GrantError>;

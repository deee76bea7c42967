use thiserror::Error;

/// Errors raised while compiling rule patterns into a policy set.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A rule was declared with an empty domain glob.
    #[error("rule has an empty domain pattern")]
    EmptyDomainPattern,

    /// A rule's method filter contains an empty entry.
    #[error("rule for domain {domain:?} has an empty method entry")]
    EmptyMethod {
        /// Domain glob of the offending rule.
        domain: String,
    },
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

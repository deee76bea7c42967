use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying i/o error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML/JSON for the expected schema.
    #[error("failed to parse config {path}: {reason}")]
    Parse {
        /// Path of the file.
        path: String,
        /// Parser error text.
        reason: String,
    },

    /// The config parsed but fails a validation rule.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

//! Error types for environment resolution.

use thiserror::Error;

/// Primary error type for configuration lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested environment key is not configured.
    #[error("unknown environment '{name}' (expected one of: {known})")]
    UnknownEnvironment {
        /// Environment key supplied by the caller.
        name: String,
        /// Comma-separated list of configured keys.
        known: String,
    },
    /// A required variable for a configured environment is unset or blank.
    #[error("missing configuration value {variable} for environment '{environment}'")]
    MissingCredential {
        /// Environment key being resolved.
        environment: String,
        /// Name of the missing variable (for example `DEV_PASSWORD`).
        variable: String,
    },
    /// A `.env` file was found but could not be read or parsed.
    #[error("failed to load .env file: {reason}")]
    EnvFile {
        /// Underlying read or parse failure.
        reason: String,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

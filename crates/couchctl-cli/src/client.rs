//! Shared error types and per-invocation dependencies for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::Context;
use couchctl_client::{ClientError, ClientOptions, CouchClient, Scheme};
use couchctl_config::{ConfigError, EnvironmentRegistry};
use serde_json::Value;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::validation(error.to_string())
    }
}

impl From<ClientError> for CliError {
    fn from(error: ClientError) -> Self {
        Self::failure(error)
    }
}

/// Dependencies constructed once at startup and shared by every handler.
pub(crate) struct CliDependencies {
    pub(crate) registry: EnvironmentRegistry,
    pub(crate) options: ClientOptions,
}

impl CliDependencies {
    /// Load the environment registry and transport options for this process.
    pub(crate) fn from_env(timeout_secs: u64, request_id: &str) -> Self {
        Self {
            registry: EnvironmentRegistry::from_env(),
            options: ClientOptions {
                timeout: Duration::from_secs(timeout_secs),
                scheme: Scheme::Https,
                request_id: Some(request_id.to_string()),
            },
        }
    }

    /// Resolve `environment` and build a client bound to it.
    pub(crate) fn context_for(&self, environment: &str) -> CliResult<AppContext> {
        let config = self.registry.resolve(environment)?;
        let client = CouchClient::new(&config, &self.options)?;
        tracing::debug!(environment, ?client, "client ready");
        Ok(AppContext { client })
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) client: CouchClient,
}

/// Result of one command, rendered by `output::render_outcome`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    /// Server payload printed as JSON.
    Json(Value),
    /// One human-readable line.
    Message(String),
    /// Nothing is printed.
    Silent,
}

impl Outcome {
    pub(crate) fn json(value: impl serde::Serialize) -> CliResult<Self> {
        serde_json::to_value(value)
            .context("failed to encode result")
            .map(Self::Json)
            .map_err(CliError::failure)
    }
}

/// Parse a document argument supplied on the command line.
pub(crate) fn parse_document(raw: &str) -> CliResult<Value> {
    serde_json::from_str(raw)
        .map_err(|err| CliError::validation(format!("document is not valid JSON: {err}")))
}

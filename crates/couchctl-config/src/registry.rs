//! Loading and resolving per-environment server credentials.
//!
//! # Design
//! - The registry is built once at startup from a variable lookup and never
//!   mutated afterwards; callers receive owned `EnvironmentConfig` values.
//! - Loading never fails. Missing values are reported by `resolve` so only the
//!   environment a command actually references has to be complete.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Environment keys that are always available.
pub const DEFAULT_ENVIRONMENTS: [&str; 3] = ["dev", "stg", "prd"];

/// Variable listing additional comma-separated environment keys.
pub const ENVIRONMENTS_VAR: &str = "COUCHCTL_ENVIRONMENTS";

const URL_SUFFIX: &str = "URL";
const USER_SUFFIX: &str = "USER";
const PASSWORD_SUFFIX: &str = "PASSWORD";

/// Endpoint and credentials for one deployment environment.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Server location, with or without a scheme prefix.
    pub base_url: String,
    /// Basic-auth user name.
    pub user: String,
    /// Basic-auth password.
    pub password: String,
}

impl Debug for EnvironmentConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EnvironmentConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct RawEnvironment {
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

/// Immutable mapping from environment key to the values read at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRegistry {
    environments: BTreeMap<String, RawEnvironment>,
}

impl EnvironmentRegistry {
    /// Load the registry from the process environment. Callers merge any
    /// `.env` file first with [`crate::load_env_file`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the registry through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut keys: Vec<String> = DEFAULT_ENVIRONMENTS
            .iter()
            .map(|key| (*key).to_string())
            .collect();
        if let Some(extra) = lookup(ENVIRONMENTS_VAR) {
            keys.extend(
                extra
                    .split(',')
                    .map(|key| key.trim().to_ascii_lowercase())
                    .filter(|key| !key.is_empty()),
            );
        }

        let environments = keys
            .into_iter()
            .map(|key| {
                let prefix = variable_prefix(&key);
                let raw = RawEnvironment {
                    url: lookup(&format!("{prefix}_{URL_SUFFIX}")),
                    user: lookup(&format!("{prefix}_{USER_SUFFIX}")),
                    password: lookup(&format!("{prefix}_{PASSWORD_SUFFIX}")),
                };
                (key, raw)
            })
            .collect::<BTreeMap<_, _>>();
        debug!(count = environments.len(), "environment registry loaded");

        Self { environments }
    }

    /// Configured environment keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Resolve an environment key into a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownEnvironment` when `name` is not configured
    /// and `ConfigError::MissingCredential` when any of its URL, user, or
    /// password values is unset or blank.
    pub fn resolve(&self, name: &str) -> ConfigResult<EnvironmentConfig> {
        let raw = self
            .environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: name.to_string(),
                known: self.names().collect::<Vec<_>>().join(", "),
            })?;

        let prefix = variable_prefix(name);
        let base_url = required(name, &prefix, URL_SUFFIX, raw.url.as_deref())?.trim();
        let user = required(name, &prefix, USER_SUFFIX, raw.user.as_deref())?.trim();
        let password = required(name, &prefix, PASSWORD_SUFFIX, raw.password.as_deref())?;

        Ok(EnvironmentConfig {
            base_url: base_url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}

fn variable_prefix(key: &str) -> String {
    key.to_ascii_uppercase().replace('-', "_")
}

fn required<'a>(
    environment: &str,
    prefix: &str,
    suffix: &str,
    value: Option<&'a str>,
) -> ConfigResult<&'a str> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingCredential {
            environment: environment.to_string(),
            variable: format!("{prefix}_{suffix}"),
        })
}

//! Merging a `.env` file into the process environment.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

/// Merge the nearest `.env` file (current directory or any parent) into the
/// process environment. Variables already set in the environment win.
///
/// Returns the path of the loaded file, or `None` when no file exists.
///
/// # Errors
///
/// Returns `ConfigError::EnvFile` when a file exists but cannot be read or
/// contains a line that does not parse.
pub fn load_env_file() -> ConfigResult<Option<PathBuf>> {
    interpret(dotenv::dotenv())
}

fn interpret(result: dotenv::Result<PathBuf>) -> ConfigResult<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(dotenv::Error::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ConfigError::EnvFile {
            reason: err.to_string(),
        }),
    }
}

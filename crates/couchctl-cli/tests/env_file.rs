//! End-to-end checks of `.env` handling through the `couchctl` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;

const SCRUBBED_VARS: [&str; 9] = [
    "RUST_LOG",
    "COUCHCTL_LOG_LEVEL",
    "COUCHCTL_LOG_FORMAT",
    "COUCHCTL_OUTPUT",
    "COUCHCTL_HTTP_TIMEOUT_SECS",
    "COUCHCTL_ENVIRONMENTS",
    "DEV_URL",
    "DEV_USER",
    "DEV_PASSWORD",
];

fn couchctl_in(dir: &Path, args: &[&str]) -> Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_couchctl"));
    command.current_dir(dir).args(args);
    for name in SCRUBBED_VARS {
        command.env_remove(name);
    }
    Ok(command.output()?)
}

#[test]
fn global_options_are_read_from_env_file() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join(".env"), "COUCHCTL_LOG_LEVEL=debug\n")?;

    let output = couchctl_in(dir.path(), &["list-dbs", "qa"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("unknown environment 'qa'"));
    assert!(stderr.contains("loaded .env file"), "stderr: {stderr}");
    assert!(stderr.contains("command failed"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn malformed_env_file_is_a_configuration_error() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join(".env"),
        "DEV_URL=couch.example\nnot a valid line\nDEV_USER=admin\nDEV_PASSWORD=pw\n",
    )?;

    let output = couchctl_in(dir.path(), &["list-dbs", "dev"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("failed to load .env file"), "stderr: {stderr}");
    assert!(stderr.contains("not a valid line"), "stderr: {stderr}");
    assert!(!stderr.contains("DEV_USER"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn missing_env_file_is_ignored() -> Result<()> {
    let dir = TempDir::new()?;

    let output = couchctl_in(dir.path(), &["list-dbs", "qa"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(!stderr.contains(".env"), "stderr: {stderr}");
    assert!(stderr.contains("unknown environment 'qa'"));
    Ok(())
}

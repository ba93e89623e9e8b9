//! Output renderers for command results.

use anyhow::anyhow;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult, Outcome};

pub(crate) fn render_outcome(outcome: &Outcome, format: OutputFormat) -> CliResult<()> {
    if let Some(text) = format_outcome(outcome, format)? {
        println!("{text}");
    }
    Ok(())
}

pub(crate) fn format_outcome(outcome: &Outcome, format: OutputFormat) -> CliResult<Option<String>> {
    match outcome {
        Outcome::Json(value) => format_json(value, format).map(Some),
        Outcome::Message(message) => Ok(Some(message.clone())),
        Outcome::Silent => Ok(None),
    }
}

fn format_json(value: &Value, format: OutputFormat) -> CliResult<String> {
    let rendered = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
        OutputFormat::Compact => serde_json::to_string(value),
    };
    rendered.map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

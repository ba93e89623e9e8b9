//! Command-line parsing and dispatch for couchctl.

use clap::{Args, Parser, Subcommand, ValueEnum};
use couchctl_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{CliDependencies, CliError, CliResult, Outcome};
use crate::commands::databases::{handle_create_db, handle_delete_db, handle_list_dbs};
use crate::commands::documents::{
    handle_delete_doc, handle_get_doc, handle_insert_doc, handle_list_docs, handle_update_doc,
};
use crate::commands::security::{handle_add_user, handle_list_users, handle_remove_user};
use crate::commands::users::{handle_create_user, handle_list_server_users};
use crate::output::render_outcome;

const DEFAULT_TIMEOUT_SECS: u64 = couchctl_client::DEFAULT_TIMEOUT.as_secs();

/// Parses CLI arguments, executes the requested command, and reports any
/// failure on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let env_file = match couchctl_config::load_env_file() {
        Ok(path) => path,
        Err(err) => return report_failure(&CliError::from(err), "startup"),
    };
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format,
    };
    if let Err(err) = couchctl_telemetry::init_logging(&logging) {
        eprintln!("warning: {err}");
    }
    if let Some(path) = &env_file {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let Cli {
        command,
        output,
        timeout,
        log_format,
        ..
    } = cli;
    let command_name = command_label(&command);
    let trace_id = Uuid::new_v4().to_string();
    let deps = CliDependencies::from_env(timeout, &trace_id);
    let span = tracing::info_span!(
        "command",
        command = command_name,
        trace_id = %trace_id,
        log_format = log_format.as_str()
    );

    let result = async {
        let outcome = dispatch(command, &deps).await?;
        render_outcome(&outcome, output)
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => 0,
        Err(err) => report_failure(&err, command_name),
    }
}

fn report_failure(err: &CliError, command_name: &str) -> i32 {
    let exit_code = err.exit_code();
    eprintln!("error: {}", err.display_message());
    tracing::debug!(command = command_name, exit_code, "command failed");
    exit_code
}

pub(crate) async fn dispatch(command: Command, deps: &CliDependencies) -> CliResult<Outcome> {
    match command {
        Command::ListDbs(args) => handle_list_dbs(deps, args).await,
        Command::ListUsers(args) => handle_list_users(deps, args).await,
        Command::CreateDb(args) => handle_create_db(deps, args).await,
        Command::AddUser(args) => handle_add_user(deps, args).await,
        Command::RemoveUser(args) => handle_remove_user(deps, args).await,
        Command::CreateUser(args) => handle_create_user(deps, args).await,
        Command::ListServerUsers(args) => handle_list_server_users(deps, args).await,
        Command::DeleteDb(args) => handle_delete_db(deps, args).await,
        Command::InsertDoc(args) => handle_insert_doc(deps, args).await,
        Command::GetDoc(args) => handle_get_doc(deps, args).await,
        Command::ListDocs(args) => handle_list_docs(deps, args).await,
        Command::UpdateDoc(args) => handle_update_doc(deps, args).await,
        Command::DeleteDoc(args) => handle_delete_doc(deps, args).await,
    }
}

#[derive(Parser)]
#[command(
    name = "couchctl",
    about = "Administrative CLI for CouchDB deployment environments"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "COUCHCTL_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Per-request timeout in seconds"
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        global = true,
        env = "COUCHCTL_OUTPUT",
        value_enum,
        default_value_t = OutputFormat::Pretty,
        help = "JSON rendering for command results"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "COUCHCTL_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "COUCHCTL_LOG_FORMAT",
        value_parser = parse_log_format,
        default_value = "pretty"
    )]
    pub(crate) log_format: LogFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List databases
    ListDbs(EnvArgs),
    /// Show a database's security document
    ListUsers(DatabaseArgs),
    /// Create a database
    CreateDb(DatabaseArgs),
    /// Grant a user access to a database
    AddUser(AddUserArgs),
    /// Revoke a user's access to a database
    RemoveUser(RemoveUserArgs),
    /// Create a server user account
    CreateUser(CreateUserArgs),
    /// List server user accounts
    ListServerUsers(EnvArgs),
    /// Delete a database
    DeleteDb(DatabaseArgs),
    /// Insert a document into a database
    InsertDoc(InsertDocArgs),
    /// Fetch a document
    GetDoc(DocumentArgs),
    /// List the documents of a database
    ListDocs(DatabaseArgs),
    /// Replace a document
    UpdateDoc(UpdateDocArgs),
    /// Delete the current revision of a document
    DeleteDoc(DocumentArgs),
}

#[derive(Args)]
pub(crate) struct EnvArgs {
    #[arg(value_name = "ENV", help = "Environment key (dev, stg, prd, ...)")]
    pub(crate) environment: String,
}

#[derive(Args)]
pub(crate) struct DatabaseArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    #[arg(value_name = "DB_NAME")]
    pub(crate) database: String,
}

#[derive(Args)]
pub(crate) struct AddUserArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    #[arg(value_name = "DB_NAME")]
    pub(crate) database: String,
    pub(crate) username: String,
    #[arg(short = 'r', long = "role", help = "Role recorded on the database members")]
    pub(crate) role: Option<String>,
}

#[derive(Args)]
pub(crate) struct RemoveUserArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    #[arg(value_name = "DB_NAME")]
    pub(crate) database: String,
    pub(crate) username: String,
}

#[derive(Args)]
pub(crate) struct CreateUserArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) role: String,
}

#[derive(Args)]
pub(crate) struct InsertDocArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    #[arg(value_name = "DB_NAME")]
    pub(crate) database: String,
    #[arg(value_name = "DOC", help = "Document as a JSON string")]
    pub(crate) document: String,
}

#[derive(Args)]
pub(crate) struct DocumentArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    #[arg(value_name = "DB_NAME")]
    pub(crate) database: String,
    #[arg(value_name = "DOC_ID")]
    pub(crate) doc_id: String,
}

#[derive(Args)]
pub(crate) struct UpdateDocArgs {
    #[arg(value_name = "ENV")]
    pub(crate) environment: String,
    #[arg(value_name = "DB_NAME")]
    pub(crate) database: String,
    #[arg(value_name = "DOC_ID")]
    pub(crate) doc_id: String,
    #[arg(value_name = "DOC", help = "Document as a JSON string")]
    pub(crate) document: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse::<LogFormat>().map_err(|err| err.to_string())
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::ListDbs(_) => "list-dbs",
        Command::ListUsers(_) => "list-users",
        Command::CreateDb(_) => "create-db",
        Command::AddUser(_) => "add-user",
        Command::RemoveUser(_) => "remove-user",
        Command::CreateUser(_) => "create-user",
        Command::ListServerUsers(_) => "list-server-users",
        Command::DeleteDb(_) => "delete-db",
        Command::InsertDoc(_) => "insert-doc",
        Command::GetDoc(_) => "get-doc",
        Command::ListDocs(_) => "list-docs",
        Command::UpdateDoc(_) => "update-doc",
        Command::DeleteDoc(_) => "delete-doc",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    use anyhow::{Result, anyhow};
    use couchctl_client::{ClientOptions, Scheme};
    use couchctl_config::EnvironmentRegistry;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    pub(crate) fn deps_for(server: &MockServer) -> CliDependencies {
        let vars: HashMap<&str, String> = HashMap::from([
            ("DEV_URL", server.base_url()),
            ("DEV_USER", "admin".to_string()),
            ("DEV_PASSWORD", "s3cret".to_string()),
        ]);
        CliDependencies {
            registry: EnvironmentRegistry::from_lookup(|name| vars.get(name).cloned()),
            options: ClientOptions {
                scheme: Scheme::Http,
                request_id: Some("test-trace".to_string()),
                ..ClientOptions::default()
            },
        }
    }

    pub(crate) fn parse(args: &[&str]) -> Result<Command> {
        let mut argv = vec!["couchctl"];
        argv.extend_from_slice(args);
        Ok(Cli::try_parse_from(argv)?.command)
    }

    pub(crate) async fn execute(server: &MockServer, args: &[&str]) -> CliResult<Outcome> {
        let command = parse(args).map_err(crate::client::CliError::failure)?;
        dispatch(command, &deps_for(server)).await
    }

    #[test]
    fn every_verb_parses_with_its_positionals() -> Result<()> {
        let cases: [(&[&str], &str); 13] = [
            (&["list-dbs", "dev"], "list-dbs"),
            (&["list-users", "dev", "shop"], "list-users"),
            (&["create-db", "dev", "shop"], "create-db"),
            (&["add-user", "dev", "shop", "alice", "-r", "reader"], "add-user"),
            (&["remove-user", "dev", "shop", "alice"], "remove-user"),
            (&["create-user", "dev", "alice", "pw", "reader"], "create-user"),
            (&["list-server-users", "dev"], "list-server-users"),
            (&["delete-db", "dev", "shop"], "delete-db"),
            (&["insert-doc", "dev", "shop", "{}"], "insert-doc"),
            (&["get-doc", "dev", "shop", "doc1"], "get-doc"),
            (&["list-docs", "dev", "shop"], "list-docs"),
            (&["update-doc", "dev", "shop", "doc1", "{}"], "update-doc"),
            (&["delete-doc", "dev", "shop", "doc1"], "delete-doc"),
        ];
        for (args, label) in cases {
            assert_eq!(command_label(&parse(args)?), label);
        }
        Ok(())
    }

    #[test]
    fn add_user_role_accepts_short_and_long_forms() -> Result<()> {
        for flag in ["-r", "--role"] {
            let Command::AddUser(args) = parse(&["add-user", "dev", "shop", "alice", flag, "reader"])?
            else {
                return Err(anyhow!("expected add-user"));
            };
            assert_eq!(args.role.as_deref(), Some("reader"));
        }
        let Command::AddUser(args) = parse(&["add-user", "dev", "shop", "alice"])? else {
            return Err(anyhow!("expected add-user"));
        };
        assert!(args.role.is_none());
        Ok(())
    }

    #[test]
    fn missing_positionals_are_rejected() {
        assert!(parse(&["create-user", "dev", "alice", "pw"]).is_err());
        assert!(parse(&["get-doc", "dev", "shop"]).is_err());
        assert!(parse(&["unknown-verb", "dev"]).is_err());
    }

    #[test]
    fn global_options_parse() -> Result<()> {
        let cli = Cli::try_parse_from([
            "couchctl",
            "list-dbs",
            "dev",
            "--output",
            "compact",
            "--timeout",
            "5",
            "--log-format",
            "json",
        ])?;
        assert_eq!(cli.output, OutputFormat::Compact);
        assert_eq!(cli.timeout, 5);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(
            Cli::try_parse_from(["couchctl", "list-dbs", "dev", "--log-format", "xml"]).is_err()
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_environment_fails_before_any_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/_all_dbs");
            then.status(200).json_body(json!([]));
        });

        let err = execute(&server, &["list-dbs", "qa"])
            .await
            .expect_err("qa is not configured");
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("unknown environment 'qa'"));
        mock.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn incomplete_environment_fails_before_any_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let err = execute(&server, &["list-dbs", "stg"])
            .await
            .expect_err("stg has no values");
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("STG_URL"));
        Ok(())
    }

    #[tokio::test]
    async fn remote_failures_exit_with_operational_code() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PUT).path("/shop");
            then.status(412)
                .json_body(json!({"error": "file_exists", "reason": "The database could not be created, the file already exists."}));
        });

        let err = execute(&server, &["create-db", "dev", "shop"])
            .await
            .expect_err("database exists");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("status 412"));
        Ok(())
    }
}
